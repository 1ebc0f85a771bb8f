//! Headless прогон ECLIPTIC ядра
//!
//! Запускает Bevy App без рендера: корабль ловит очередь попаданий,
//! в консоль уходят health, состояние дыма и статистика пула.

use bevy::prelude::*;
use ecliptic_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting ECLIPTIC headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    // Плоскость боя: anchor в мировом origin
    app.world_mut().spawn((Transform::IDENTITY, PlaneAnchor));

    // Корабль: сам себе damage source и render surface, дым — ребёнок
    let ship = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(4.0, 0.0, 0.0)),
            Ship { faction_id: 1 },
            SurfaceOverride::default(),
            EffectCoordinator {
                spark_template: Some(EffectTemplate::one_shot("res://fx/spark_burst.tscn", 0.8)),
                death_template: Some(EffectTemplate::one_shot(
                    "res://fx/ship_explosion.tscn",
                    2.5,
                )),
                ..Default::default()
            },
        ))
        .id();
    app.world_mut()
        .spawn((Transform::IDENTITY, EffectEmitter::default(), ChildOf(ship)));

    // 240 тиков, попадание каждые 40
    for tick in 0..240 {
        if tick % 40 == 20 {
            app.world_mut().send_event(DamageInbound {
                attacker: None,
                target: ship,
                amount: 18,
                hit_point: Vec3::new(4.0, 0.5, 0.0),
            });
        }

        app.update();

        if tick % 40 == 21 {
            let world = app.world();
            let health = world.get::<Health>(ship);
            let smoke = world
                .get::<EffectCoordinator>(ship)
                .map(|c| c.smoke_visible())
                .unwrap_or(false);
            let pool = world.resource::<EffectPool>();
            println!(
                "Tick {}: health={:?} smoke={} live_effects={}",
                tick,
                health.map(|h| h.current),
                smoke,
                pool.live_count()
            );
        }
    }

    println!("Simulation complete!");
}
