//! Combat event module (интерфейсная граница DamageSource)
//!
//! ECS ответственность:
//! - Game state: Health
//! - Events: DamageTaken, HealthChanged, EntityDied (наблюдаемые каналы)
//!
//! Ответственность gameplay-слоя (вне ядра):
//! - Расчёт урона (оружие, броня, модификаторы)
//! - Hit detection → DamageInbound события
//!
//! VFX-слой (crate::vfx) только читает каналы — никогда не мутирует урон.

use bevy::prelude::*;

pub mod damage;

// Re-export основных типов
pub use damage::{apply_damage, DamageInbound, DamageTaken, Dead, EntityDied, HealthChanged};

/// Combat Plugin
///
/// Регистрирует event-каналы и apply_damage в Update (SimSet::Damage).
///
/// Гарантия порядка: для одного применения урона DamageTaken и
/// соответствующий HealthChanged пишутся одним вызовом системы —
/// наблюдатели видят оба в том же тике, в порядке эмиссии.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageInbound>()
            .add_event::<DamageTaken>()
            .add_event::<HealthChanged>()
            .add_event::<EntityDied>();

        // Damage application — до VFX-реакций в том же тике
        app.add_systems(
            Update,
            (damage::apply_damage, damage::mark_dead)
                .chain()
                .in_set(crate::SimSet::Damage),
        );
    }
}
