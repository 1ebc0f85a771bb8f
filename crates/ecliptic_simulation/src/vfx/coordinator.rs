//! Effect coordinator — связывает damage-каналы с визуальными реакциями
//!
//! Координатор вешается на каждый damageable-объект и наблюдает его
//! DamageSource (event-фильтрация по привязанному entity):
//! - HealthChanged → continuous detail scale + дым по порогу 50%
//! - DamageTaken → spark burst в точке попадания + damage flash
//! - EntityDied → death burst в позиции координатора
//!
//! Каждая отсутствующая опциональная привязка (source, surface, smoke,
//! шаблоны) молча гасит свою фичу — визуальный слой assets-optional,
//! ошибок здесь нет by contract.

use bevy::ecs::component::HookContext;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;
use rand::Rng;

use crate::combat::{DamageTaken, EntityDied, HealthChanged};
use crate::components::Health;
use crate::plane::GameplayPlane;
use crate::vfx::flash::DamageFlash;
use crate::vfx::pool::{EffectPool, EffectTemplate};
use crate::vfx::surface::{EffectEmitter, SurfaceOverride};
use crate::vfx::VfxSettings;
use crate::DeterministicRng;

/// Доля здоровья, строго ниже которой включается дым
pub const SMOKE_HEALTH_THRESHOLD: f32 = 0.5;

/// Detail scale по доле здоровья: lerp(2.0, 0.0, ratio)
///
/// 0.0 у целого корпуса, 2.0 при нуле здоровья — поверхностные
/// повреждения усиливаются по мере падения здоровья.
pub fn damage_detail_for(health_ratio: f32) -> f32 {
    2.0 * (1.0 - health_ratio.clamp(0.0, 1.0))
}

/// Координатор визуальных реакций одного damageable-объекта
///
/// Привязки (source/surface/smoke) либо задаются явно, либо
/// резолвятся системой bind_coordinators при attach. Координатор
/// без source — пассивный навсегда (не ошибка).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[component(on_remove = on_coordinator_removed)]
pub struct EffectCoordinator {
    /// Наблюдаемый damage source (entity с Health)
    pub source: Option<Entity>,

    /// Render target с SurfaceOverride (обычно сам объект)
    pub surface: Option<Entity>,

    /// Looping smoke-эффект (обычно ребёнок объекта)
    pub smoke: Option<Entity>,

    /// Шаблон искр попадания
    pub spark_template: Option<EffectTemplate>,

    /// Шаблон death burst
    pub death_template: Option<EffectTemplate>,

    pub flash_color: Vec4,
    pub flash_duration: f32,

    /// Кэш текущего состояния дыма — запись в emitter только при смене
    pub smoke_visible: bool,
}

impl Default for EffectCoordinator {
    fn default() -> Self {
        Self {
            source: None,
            surface: None,
            smoke: None,
            spark_template: None,
            death_template: None,
            flash_color: Vec4::new(1.0, 0.2, 0.2, 1.0), // красная вспышка попадания
            flash_duration: 0.2,
            smoke_visible: false,
        }
    }
}

impl EffectCoordinator {
    /// Detach: сбрасывает source-привязку
    ///
    /// Идемпотентен; единственный владелец «отписки» — после сброса
    /// все четыре логических подписки (HealthChanged, DamageTaken ×2,
    /// EntityDied) гаснут разом: event-фильтры перестают совпадать.
    pub fn detach(&mut self) {
        self.source = None;
    }

    pub fn smoke_visible(&self) -> bool {
        self.smoke_visible
    }
}

/// on_remove hook: disable координатора не оставляет stale-состояния —
/// in-flight flash на surface отбрасывается, tint возвращается к base
fn on_coordinator_removed(mut world: DeferredWorld, context: HookContext) {
    let Some(coordinator) = world.get::<EffectCoordinator>(context.entity) else {
        return;
    };
    let Some(surface) = coordinator.surface else {
        return;
    };

    let Some(base_color) = world.get::<DamageFlash>(surface).map(|f| f.base_color) else {
        return;
    };
    if let Some(mut surface_override) = world.get_mut::<SurfaceOverride>(surface) {
        surface_override.tint = base_color;
    }
    world.commands().entity(surface).remove::<DamageFlash>();
}

/// System: attach свежих координаторов
///
/// Для каждого Added<EffectCoordinator> с пустыми привязками:
/// - source: сам entity с Health, иначе ближайший предок по ChildOf
/// - surface: сам entity с SurfaceOverride, иначе прямой ребёнок
/// - smoke: прямой ребёнок с EffectEmitter
///
/// Re-attach после detach = повторная вставка компонента (Added
/// срабатывает заново). Ничего не нашли — остаёмся пассивными.
pub fn bind_coordinators(
    mut coordinators: Query<(Entity, &mut EffectCoordinator), Added<EffectCoordinator>>,
    parents: Query<&ChildOf>,
    healths: Query<(), With<Health>>,
    surface_children: Query<(Entity, &ChildOf), With<SurfaceOverride>>,
    surfaces: Query<(), With<SurfaceOverride>>,
    emitter_children: Query<(Entity, &ChildOf), With<EffectEmitter>>,
) {
    for (entity, mut coordinator) in coordinators.iter_mut() {
        if coordinator.source.is_none() {
            coordinator.source = find_source(entity, &parents, &healths);
            if coordinator.source.is_none() {
                crate::log(&format!(
                    "EffectCoordinator {:?}: no damage source in hierarchy, staying passive",
                    entity
                ));
            }
        }

        if coordinator.surface.is_none() {
            coordinator.surface = if surfaces.contains(entity) {
                Some(entity)
            } else {
                surface_children
                    .iter()
                    .find(|(_, child_of)| child_of.parent() == entity)
                    .map(|(surface, _)| surface)
            };
        }

        if coordinator.smoke.is_none() {
            coordinator.smoke = emitter_children
                .iter()
                .find(|(_, child_of)| child_of.parent() == entity)
                .map(|(smoke, _)| smoke);
        }
    }
}

/// Ищет Health на самом entity, иначе поднимается по предкам
fn find_source(
    start: Entity,
    parents: &Query<&ChildOf>,
    healths: &Query<(), With<Health>>,
) -> Option<Entity> {
    let mut cursor = start;
    loop {
        if healths.contains(cursor) {
            return Some(cursor);
        }
        cursor = parents.get(cursor).ok()?.parent();
    }
}

/// System: реакция на HealthChanged — detail scale + дым
///
/// Detail scale — continuous, пишется на каждый event в per-instance
/// override. Дым — дискретный порог 50%: переключение только при
/// смене желаемого состояния (никакого повторного toggle каждый event).
pub fn react_to_health_changes(
    settings: Res<VfxSettings>,
    mut health_events: EventReader<HealthChanged>,
    mut coordinators: Query<&mut EffectCoordinator>,
    mut surfaces: Query<&mut SurfaceOverride>,
    mut emitters: Query<&mut EffectEmitter>,
) {
    if !settings.effects_enabled {
        health_events.clear();
        return;
    }

    for event in health_events.read() {
        let ratio = if event.max == 0 {
            0.0
        } else {
            event.current as f32 / event.max as f32
        };

        for mut coordinator in coordinators.iter_mut() {
            if coordinator.source != Some(event.entity) {
                continue;
            }

            if let Some(surface) = coordinator.surface {
                if let Ok(mut surface_override) = surfaces.get_mut(surface) {
                    surface_override.damage_detail = damage_detail_for(ratio);
                }
            }

            let desired = ratio < SMOKE_HEALTH_THRESHOLD;
            if desired != coordinator.smoke_visible {
                if let Some(smoke) = coordinator.smoke {
                    if let Ok(mut emitter) = emitters.get_mut(smoke) {
                        emitter.emitting = desired;
                        coordinator.smoke_visible = desired;
                    }
                }
            }
        }
    }
}

/// System: реакция A на DamageTaken — spark burst в точке попадания
///
/// amount == 0 («касание») искр не даёт. Burst ориентируется вдоль
/// нормали gameplay plane, roll вокруг неё — детерминированный jitter.
pub fn spawn_damage_sparks(
    mut commands: Commands,
    settings: Res<VfxSettings>,
    plane: Res<GameplayPlane>,
    mut rng: ResMut<DeterministicRng>,
    mut damage_events: EventReader<DamageTaken>,
    coordinators: Query<&EffectCoordinator>,
    mut pool: ResMut<EffectPool>,
) {
    if !settings.effects_enabled {
        damage_events.clear();
        return;
    }

    for event in damage_events.read() {
        if event.amount == 0 {
            continue;
        }

        for coordinator in coordinators.iter() {
            if coordinator.source != Some(event.target) {
                continue;
            }
            let Some(template) = &coordinator.spark_template else {
                continue;
            };

            let normal = plane.current().normal;
            let roll = rng.rng.gen_range(0.0..std::f32::consts::TAU);
            let rotation =
                Quat::from_axis_angle(normal, roll) * Quat::from_rotation_arc(Vec3::Z, normal);
            pool.acquire(&mut commands, template, event.hit_point, rotation);
        }
    }
}

/// System: реакция B на DamageTaken — damage flash
///
/// Re-trigger при in-flight анимации: restart с нуля (никакого
/// блендинга двух вспышек), baseline первой активации сохраняется.
/// Без привязанного surface вспышка молча не срабатывает.
pub fn trigger_damage_flash(
    mut commands: Commands,
    settings: Res<VfxSettings>,
    mut damage_events: EventReader<DamageTaken>,
    coordinators: Query<&EffectCoordinator>,
    mut surfaces: Query<(&SurfaceOverride, Option<&mut DamageFlash>)>,
) {
    if !settings.effects_enabled {
        damage_events.clear();
        return;
    }

    for event in damage_events.read() {
        if event.amount == 0 {
            continue;
        }

        for coordinator in coordinators.iter() {
            if coordinator.source != Some(event.target) {
                continue;
            }
            let Some(surface) = coordinator.surface else {
                continue;
            };
            let Ok((surface_override, flash)) = surfaces.get_mut(surface) else {
                continue;
            };

            match flash {
                Some(mut flash) => flash.restart(),
                None => {
                    commands.entity(surface).insert(DamageFlash::new(
                        surface_override.base_color,
                        coordinator.flash_color,
                        coordinator.flash_duration,
                    ));
                }
            }
        }
    }
}

/// System: реакция на EntityDied — death burst
///
/// Burst в позиции координатора (не в точке последнего попадания).
/// Для самого координатора это обычный event — teardown сверх
/// штатного disable не нужен.
pub fn spawn_death_bursts(
    mut commands: Commands,
    settings: Res<VfxSettings>,
    mut death_events: EventReader<EntityDied>,
    coordinators: Query<(Entity, &EffectCoordinator)>,
    transforms: Query<&Transform>,
    mut pool: ResMut<EffectPool>,
) {
    if !settings.effects_enabled {
        death_events.clear();
        return;
    }

    for event in death_events.read() {
        for (coordinator_entity, coordinator) in coordinators.iter() {
            if coordinator.source != Some(event.entity) {
                continue;
            }
            let Some(template) = &coordinator.death_template else {
                continue;
            };

            let (position, rotation) = transforms
                .get(coordinator_entity)
                .map(|t| (t.translation, t.rotation))
                .unwrap_or((Vec3::ZERO, Quat::IDENTITY));
            pool.acquire(&mut commands, template, position, rotation);

            crate::log(&format!(
                "Death burst for {:?} at {:?}",
                event.entity, position
            ));
        }
    }
}
