//! VFX integration tests
//!
//! Headless прогон полного цикла: DamageInbound → каналы → реакции.
//!
//! Проверяем:
//! - detail scale / дым по порогу (без лишних записей)
//! - пул: переиспользование, авто-release, no-double-use
//! - flash: restart-семантика, точный возврат base-цвета
//! - глобальный VFX-переключатель и detach/disable координатора
//! - детерминизм (2 прогона с одним seed)

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use ecliptic_simulation::*;

const TICK: Duration = Duration::from_millis(50);
const SPARK_FX: &str = "res://fx/spark_burst.tscn";
const DEATH_FX: &str = "res://fx/ship_explosion.tscn";

/// Helper: App с детерминированным clock'ом (50ms на update)
fn create_vfx_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(TICK));
    app
}

/// Helper: spawn корабля с координатором + smoke-ребёнком.
/// Один settle-update, чтобы bind_coordinators отработал.
fn spawn_ship(app: &mut App) -> (Entity, Entity) {
    let ship = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(2.0, 1.0, 0.0)),
            Ship { faction_id: 1 },
            SurfaceOverride::default(),
            EffectCoordinator {
                spark_template: Some(EffectTemplate::one_shot(SPARK_FX, 0.3)),
                death_template: Some(EffectTemplate::one_shot(DEATH_FX, 1.0)),
                ..Default::default()
            },
        ))
        .id();
    let smoke = app
        .world_mut()
        .spawn((Transform::IDENTITY, EffectEmitter::default(), ChildOf(ship)))
        .id();

    app.update();
    (ship, smoke)
}

/// Helper: попадание по цели
fn hit(app: &mut App, target: Entity, amount: u32) {
    app.world_mut().send_event(DamageInbound {
        attacker: None,
        target,
        amount,
        hit_point: Vec3::new(2.0, 1.5, 0.0),
    });
}

/// Helper: все pooled-инстансы указанного шаблона
fn pooled_effects(app: &mut App, effect_path: &str) -> Vec<(Entity, bool)> {
    let mut query = app.world_mut().query::<(Entity, &PooledEffect)>();
    query
        .iter(app.world())
        .filter(|(_, effect)| effect.effect_path == effect_path)
        .map(|(entity, effect)| (entity, effect.active))
        .collect()
}

#[test]
fn test_detail_scale_and_smoke_below_threshold() {
    let mut app = create_vfx_app(42);
    let (ship, smoke) = spawn_ship(&mut app);

    // 100 → 40: ratio 0.4, порог дыма 0.5 пройден
    hit(&mut app, ship, 60);
    app.update();

    let surface = app.world().get::<SurfaceOverride>(ship).unwrap();
    assert!(
        (surface.damage_detail - 1.2).abs() < 1e-5,
        "detail = {}",
        surface.damage_detail
    );

    let emitter = app.world().get::<EffectEmitter>(smoke).unwrap();
    assert!(emitter.emitting, "smoke must be visible below 50% health");
}

#[test]
fn test_smoke_hidden_above_threshold_without_redundant_writes() {
    let mut app = create_vfx_app(42);
    let (ship, smoke) = spawn_ship(&mut app);

    let baseline_tick = app
        .world()
        .entity(smoke)
        .get_ref::<EffectEmitter>()
        .unwrap()
        .last_changed();

    // 100 → 60: ratio 0.6 ≥ 0.5 — дым скрыт, и emitter не трогали вовсе
    hit(&mut app, ship, 40);
    app.update();

    let emitter = app.world().entity(smoke).get_ref::<EffectEmitter>().unwrap();
    assert!(!emitter.emitting);
    assert_eq!(
        emitter.last_changed(),
        baseline_tick,
        "hidden → hidden must not touch the emitter"
    );

    // 60 → 40: дым включился (одна запись)
    hit(&mut app, ship, 20);
    app.update();
    let toggled_tick = app
        .world()
        .entity(smoke)
        .get_ref::<EffectEmitter>()
        .unwrap()
        .last_changed();
    assert_ne!(toggled_tick, baseline_tick);

    // 40 → 30: всё ещё ниже порога — повторной записи нет
    hit(&mut app, ship, 10);
    app.update();
    let emitter = app.world().entity(smoke).get_ref::<EffectEmitter>().unwrap();
    assert!(emitter.emitting);
    assert_eq!(
        emitter.last_changed(),
        toggled_tick,
        "visible → visible must not touch the emitter"
    );
}

#[test]
fn test_zero_amount_hit_is_inert() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);

    hit(&mut app, ship, 0);
    app.update();

    assert!(pooled_effects(&mut app, SPARK_FX).is_empty());
    assert!(app.world().get::<DamageFlash>(ship).is_none());
}

#[test]
fn test_spark_pool_reuse_after_auto_release() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);

    hit(&mut app, ship, 10);
    app.update();

    let sparks = pooled_effects(&mut app, SPARK_FX);
    assert_eq!(sparks.len(), 1);
    let (first_spark, active) = sparks[0];
    assert!(active);

    // Burst длится 0.3s — 8 тиков с запасом до авто-release
    for _ in 0..8 {
        app.update();
    }
    let sparks = pooled_effects(&mut app, SPARK_FX);
    assert_eq!(sparks.len(), 1);
    assert!(!sparks[0].1, "finished burst must be inactive");
    assert_eq!(app.world().resource::<EffectPool>().free_count(SPARK_FX), 1);

    // Повторное попадание: тот же инстанс, без новой аллокации
    hit(&mut app, ship, 10);
    app.update();

    let sparks = pooled_effects(&mut app, SPARK_FX);
    assert_eq!(sparks.len(), 1, "pool must reuse, not allocate");
    assert_eq!(sparks[0].0, first_spark);
    assert!(sparks[0].1);
}

#[test]
fn test_concurrent_hits_get_distinct_instances() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);

    // Два попадания одним тиком — два разных инстанса одного шаблона
    hit(&mut app, ship, 5);
    hit(&mut app, ship, 5);
    app.update();

    let sparks = pooled_effects(&mut app, SPARK_FX);
    assert_eq!(sparks.len(), 2);
    assert_ne!(sparks[0].0, sparks[1].0);
    assert!(sparks[0].1 && sparks[1].1);
}

#[test]
fn test_flash_restart_yields_single_animation() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);
    let base = app.world().get::<SurfaceOverride>(ship).unwrap().base_color;

    // Flash duration 0.2s, тик 50ms
    hit(&mut app, ship, 10);
    app.update(); // elapsed 0.05 — fade-in
    assert!(app.world().get::<DamageFlash>(ship).is_some());
    assert_ne!(app.world().get::<SurfaceOverride>(ship).unwrap().tint, base);

    app.update(); // elapsed 0.10 — пик вспышки

    // Re-trigger до завершения: restart с нуля
    hit(&mut app, ship, 10);
    app.update(); // elapsed 0.05 после рестарта
    app.update(); // 0.10
    app.update(); // 0.15 — без рестарта анимация уже завершилась бы (0.25 > 0.2)
    assert!(
        app.world().get::<DamageFlash>(ship).is_some(),
        "restart must reset timing to zero"
    );
    assert_ne!(app.world().get::<SurfaceOverride>(ship).unwrap().tint, base);

    app.update(); // 0.20 — завершение: одна анимация ровно configured duration
    assert!(app.world().get::<DamageFlash>(ship).is_none());
    assert_eq!(
        app.world().get::<SurfaceOverride>(ship).unwrap().tint,
        base,
        "flash must end on the exact base color"
    );
}

#[test]
fn test_death_burst_fires_once() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);

    hit(&mut app, ship, 150);
    app.update();

    assert!(app.world().get::<Dead>(ship).is_some());
    assert_eq!(pooled_effects(&mut app, DEATH_FX).len(), 1);

    // Добивание трупа: EntityDied не эмитится повторно — второго взрыва нет
    hit(&mut app, ship, 150);
    app.update();
    assert_eq!(pooled_effects(&mut app, DEATH_FX).len(), 1);
}

#[test]
fn test_disabled_vfx_suppresses_everything() {
    let mut app = create_vfx_app(42);
    let (ship, smoke) = spawn_ship(&mut app);

    app.world_mut().resource_mut::<VfxSettings>().effects_enabled = false;

    // Смертельный залп при выключенных VFX
    hit(&mut app, ship, 150);
    app.update();

    assert!(pooled_effects(&mut app, SPARK_FX).is_empty());
    assert!(pooled_effects(&mut app, DEATH_FX).is_empty());
    assert!(app.world().get::<DamageFlash>(ship).is_none());

    let surface = app.world().get::<SurfaceOverride>(ship).unwrap();
    assert_eq!(surface.damage_detail, 0.0, "detail override is gated too");
    assert!(!app.world().get::<EffectEmitter>(smoke).unwrap().emitting);

    // Gameplay-state от переключателя не зависит
    assert_eq!(app.world().get::<Health>(ship).unwrap().current, 0);
}

#[test]
fn test_detach_drops_all_reactions() {
    let mut app = create_vfx_app(42);
    let (ship, smoke) = spawn_ship(&mut app);

    app.world_mut()
        .get_mut::<EffectCoordinator>(ship)
        .unwrap()
        .detach();

    // Ниже порога дыма, но координатор отписан — реакций нет
    hit(&mut app, ship, 60);
    app.update();

    assert!(pooled_effects(&mut app, SPARK_FX).is_empty());
    assert!(app.world().get::<DamageFlash>(ship).is_none());
    assert_eq!(
        app.world().get::<SurfaceOverride>(ship).unwrap().damage_detail,
        0.0
    );
    assert!(!app.world().get::<EffectEmitter>(smoke).unwrap().emitting);

    // Урон при этом применился — ядро не владеет gameplay-state
    assert_eq!(app.world().get::<Health>(ship).unwrap().current, 40);
}

#[test]
fn test_coordinator_removal_discards_inflight_flash() {
    let mut app = create_vfx_app(42);
    let (ship, _) = spawn_ship(&mut app);
    let base = app.world().get::<SurfaceOverride>(ship).unwrap().base_color;

    hit(&mut app, ship, 10);
    app.update();
    assert!(app.world().get::<DamageFlash>(ship).is_some());

    // Disable координатора посреди анимации (pooled-ship сценарий)
    app.world_mut().entity_mut(ship).remove::<EffectCoordinator>();
    app.world_mut().flush();

    assert!(
        app.world().get::<DamageFlash>(ship).is_none(),
        "in-flight flash must be discarded on detach"
    );
    assert_eq!(app.world().get::<SurfaceOverride>(ship).unwrap().tint, base);
}

#[test]
fn test_vfx_determinism_two_runs() {
    fn run_scenario(seed: u64) -> (Vec<u8>, Vec<u8>) {
        let mut app = create_vfx_app(seed);
        let (ship, _) = spawn_ship(&mut app);

        for tick in 0..30 {
            if tick % 7 == 3 {
                hit(&mut app, ship, 12);
            }
            app.update();
        }

        (
            world_snapshot::<PooledEffect>(app.world_mut()),
            world_snapshot::<Health>(app.world_mut()),
        )
    }

    let run1 = run_scenario(42);
    let run2 = run_scenario(42);
    assert_eq!(run1, run2, "same seed must give identical VFX state");
}
