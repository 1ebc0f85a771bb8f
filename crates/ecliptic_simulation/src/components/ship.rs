//! Базовые компоненты боевых объектов: Ship, Health

use bevy::prelude::*;

/// Боевой объект (корабль, астероид, турель) — всё, что живёт на gameplay plane
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Ship {
    /// Stable ID фракции (для будущих reputation/diplomacy правил)
    pub faction_id: u64,
}

/// Здоровье объекта
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Доля оставшегося здоровья в [0, 1] — читается визуальным слоем
    pub fn ratio(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }
}
