//! VFX module — пул эффектов и damage-реакции
//!
//! ECS ответственность:
//! - Effect pool: переиспользование burst-инстансов без деспавна
//! - Координация: damage-каналы → flash / искры / дым / death burst
//! - Render-state: per-instance SurfaceOverride, EffectEmitter toggle
//!
//! Ответственность клиентского слоя (вне ядра):
//! - Партиклы, шейдеры, материалы — трансляция компонентов в рендер
//!
//! Весь слой чисто косметический: ни одна отсутствующая привязка
//! не ломает gameplay-state, которым слой не владеет.

use bevy::prelude::*;

pub mod coordinator;
pub mod flash;
pub mod pool;
pub mod surface;

// Re-export основных типов
pub use coordinator::{
    bind_coordinators, damage_detail_for, react_to_health_changes, spawn_damage_sparks,
    spawn_death_bursts, trigger_damage_flash, EffectCoordinator, SMOKE_HEALTH_THRESHOLD,
};
pub use flash::{advance_damage_flash, DamageFlash, FlashPhase, FlashSample};
pub use pool::{
    release_finished_effects, EffectLifetime, EffectPool, EffectTemplate, PooledEffect,
};
pub use surface::{EffectEmitter, SurfaceOverride};

/// Process-wide VFX переключатель
///
/// false подавляет ВСЕ визуальные записи единообразно: flash, искры,
/// дым, death burst и detail override — каждая запись за одним флагом.
#[derive(Resource, Debug, Clone, Copy)]
pub struct VfxSettings {
    pub effects_enabled: bool,
}

impl Default for VfxSettings {
    fn default() -> Self {
        Self {
            effects_enabled: true,
        }
    }
}

/// VFX Plugin
///
/// Регистрирует пул + реакции в Update (SimSet::Vfx, после damage).
///
/// Порядок выполнения:
/// 1. bind_coordinators — attach свежих координаторов
/// 2. react_to_health_changes — detail scale + дым
/// 3. spawn_damage_sparks / trigger_damage_flash — реакции на DamageTaken
/// 4. spawn_death_bursts — death burst
/// 5. advance_damage_flash — шаг flash-анимаций (включая свежезапущенные)
/// 6. release_finished_effects — авто-возврат burst'ов в пул
pub struct VfxPlugin;

impl Plugin for VfxPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VfxSettings>()
            .init_resource::<EffectPool>();

        app.add_systems(
            Update,
            (
                bind_coordinators,
                react_to_health_changes,
                spawn_damage_sparks,
                trigger_damage_flash,
                spawn_death_bursts,
                advance_damage_flash,
                release_finished_effects,
            )
                .chain()
                .in_set(crate::SimSet::Vfx),
        );
    }
}
