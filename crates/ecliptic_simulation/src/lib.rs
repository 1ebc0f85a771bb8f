//! ECLIPTIC Simulation Core
//!
//! Headless ECS-ядро (Bevy 0.16) пространственно-эффектной подсистемы
//! космического боя. Геймплей намеренно 2D: вся боевая геометрия живёт
//! на одной абстрактной плоскости, встроенной в 3D мир.
//!
//! Подсистемы:
//! - plane: gameplay plane + конвертация координат (lazy fallback)
//! - combat: наблюдаемые каналы урона/смерти (интерфейс DamageSource)
//! - vfx: пул эффектов + damage-реакции (flash, дым, искры, взрыв)
//!
//! Движение/AI/расчёт урона и рендер — клиентские слои; ядро гоняется
//! детерминистично без графики.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod logger;
pub mod plane;
pub mod vfx;

// Re-export базовых типов для удобства
pub use combat::{
    apply_damage, CombatPlugin, DamageInbound, DamageTaken, Dead, EntityDied, HealthChanged,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use plane::{GameplayPlane, PlaneAnchor, PlaneFrame, PlanePlugin};
pub use vfx::{
    DamageFlash, EffectCoordinator, EffectEmitter, EffectLifetime, EffectPool, EffectTemplate,
    FlashPhase, PooledEffect, SurfaceOverride, VfxPlugin, VfxSettings,
};

/// Фазы одного логического тика (один app.update() = один тик)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Lazy-резолв gameplay plane
    Plane,
    /// Применение урона + эмиссия каналов
    Damage,
    /// Визуальные реакции (читают каналы того же тика)
    Vfx,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для будущих gameplay-систем
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            // Порядок фаз внутри тика: plane → damage → vfx
            .configure_sets(Update, (SimSet::Plane, SimSet::Damage, SimSet::Vfx).chain())
            // Подсистемы
            .add_plugins((PlanePlugin, CombatPlugin, VfxPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Debug-байты, отсортированные по Entity ID. Полноценный serde-формат
/// придёт вместе с persistence-слоем.
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
