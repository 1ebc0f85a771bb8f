//! Render-state компоненты (интерфейсная граница render-target)
//!
//! Симуляция рендером не владеет — клиентский слой читает эти компоненты
//! и транслирует в материалы/шейдеры. Цвета — Vec4 RGBA.

use bevy::prelude::*;

/// Per-instance override рендер-состояния
///
/// Аналог property block: эксклюзивно принадлежит своему координатору,
/// общий материал не мутируется — инстансы с одним базовым материалом
/// не влияют друг на друга.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SurfaceOverride {
    /// Авторский базовый цвет (baseline-lookup для flash)
    pub base_color: Vec4,

    /// Текущий применяемый цвет
    pub tint: Vec4,

    /// Detail/damage scale: 0.0 — целый корпус, 2.0 — корпус при нуле здоровья
    pub damage_detail: f32,
}

impl Default for SurfaceOverride {
    fn default() -> Self {
        Self::with_base_color(Vec4::new(0.5, 0.5, 0.5, 1.0)) // нейтральный hull-серый
    }
}

impl SurfaceOverride {
    pub fn with_base_color(base_color: Vec4) -> Self {
        Self {
            base_color,
            tint: base_color,
            damage_detail: 0.0,
        }
    }
}

/// Looping-эффект с переключаемой эмиссией (дым повреждений)
///
/// Координатор пишет emitting только при смене желаемого состояния —
/// клиентский слой может безопасно вешаться на change detection.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct EffectEmitter {
    pub emitting: bool,
}
