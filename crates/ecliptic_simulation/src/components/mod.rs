//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - ship: базовые характеристики боевых объектов (Ship, Health)
//!
//! VFX-компоненты (SurfaceOverride, EffectEmitter, EffectCoordinator)
//! живут в crate::vfx — они принадлежат визуальному слою.

pub mod ship;

// Re-exports для удобного импорта
pub use ship::*;
