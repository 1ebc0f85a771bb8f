//! Damage flash — двухфазная цветовая анимация попадания
//!
//! Явная state machine вместо корутины: компонент держит elapsed/phase,
//! внешний драйвер (advance_damage_flash) продвигает её раз в тик.
//! Отмена = перезапись состояния, никакого unwind — только финальный
//! возврат точного base-цвета.

use bevy::prelude::*;

use crate::vfx::surface::SurfaceOverride;

/// Фаза анимации (Idle = отсутствие компонента)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum FlashPhase {
    /// Первая половина длительности: base → flash
    FadeIn,
    /// Вторая половина: flash → base
    FadeOut,
}

/// Результат одного шага анимации
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashSample {
    pub color: Vec4,
    pub finished: bool,
}

/// Активная flash-анимация на surface entity
///
/// Максимум одна на entity (семантика компонента). Restart сбрасывает
/// timing, но сохраняет base_color первой активации — без дрейфа
/// к flash-цвету при частых повторных попаданиях.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DamageFlash {
    pub base_color: Vec4,
    pub flash_color: Vec4,
    pub duration: f32,
    pub elapsed: f32,
    pub phase: FlashPhase,
}

impl DamageFlash {
    pub fn new(base_color: Vec4, flash_color: Vec4, duration: f32) -> Self {
        Self {
            base_color,
            flash_color,
            // Нулевая длительность выродилась бы в деление на ноль
            duration: duration.max(1e-6),
            elapsed: 0.0,
            phase: FlashPhase::FadeIn,
        }
    }

    /// Cancel-and-restart: in-flight анимация отбрасывается целиком,
    /// timing с нуля, baseline не трогаем
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        self.phase = FlashPhase::FadeIn;
    }

    /// Один шаг анимации: продвигает elapsed и возвращает цвет шага.
    /// После finished цвет — ровно base_color.
    pub fn advance(&mut self, delta: f32) -> FlashSample {
        self.elapsed += delta;
        let half = self.duration * 0.5;

        if self.elapsed < half {
            self.phase = FlashPhase::FadeIn;
            FlashSample {
                color: self.base_color.lerp(self.flash_color, self.elapsed / half),
                finished: false,
            }
        } else if self.elapsed < self.duration {
            self.phase = FlashPhase::FadeOut;
            FlashSample {
                color: self
                    .flash_color
                    .lerp(self.base_color, (self.elapsed - half) / half),
                finished: false,
            }
        } else {
            FlashSample {
                color: self.base_color,
                finished: true,
            }
        }
    }
}

/// System: продвигает все активные flash-анимации на один шаг
///
/// Time<Real> — wall-clock, не зависит от simulation time-scale
/// (вспышка доигрывает и в паузе). По завершении: точный base-цвет
/// и удаление компонента (переход в Idle).
pub fn advance_damage_flash(
    mut commands: Commands,
    time: Res<Time<Real>>,
    mut flashes: Query<(Entity, &mut DamageFlash, &mut SurfaceOverride)>,
) {
    for (entity, mut flash, mut surface) in flashes.iter_mut() {
        let sample = flash.advance(time.delta_secs());
        surface.tint = sample.color;

        if sample.finished {
            surface.tint = flash.base_color;
            commands.entity(entity).remove::<DamageFlash>();
        }
    }
}
