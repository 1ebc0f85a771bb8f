//! Damage application система
//!
//! Превращает входящие DamageInbound события (от hit detection gameplay-слоя)
//! в мутацию Health и три наблюдаемых канала:
//! DamageTaken → HealthChanged → EntityDied (в этом порядке, одним тиком).

use bevy::prelude::*;

use crate::components::Health;

/// Событие-вход: gameplay-слой сообщает о попадании
///
/// Ядро не считает урон — amount приходит уже финальным.
#[derive(Event, Debug, Clone)]
pub struct DamageInbound {
    /// Кто нанёс урон (None = среда: столкновение, поле астероидов)
    pub attacker: Option<Entity>,

    /// Кому нанесён урон
    pub target: Entity,

    /// Финальный урон (0 допустим — «касание», реакции его игнорируют)
    pub amount: u32,

    /// Мировая точка попадания (для spark VFX)
    pub hit_point: Vec3,
}

/// Событие: урон применён к Health
#[derive(Event, Debug, Clone)]
pub struct DamageTaken {
    pub target: Entity,
    pub amount: u32,
    pub hit_point: Vec3,
}

/// Событие: здоровье изменилось
#[derive(Event, Debug, Clone)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: u32,
    pub previous: u32,
    pub max: u32,
}

/// Событие: entity умер (health дошло до 0)
///
/// Эмитится ровно один раз — на переходе alive → dead.
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв (Health == 0)
///
/// Используется визуальными эффектами (death burst, fade-out).
/// Деспавн не автоматический — обломки остаются на плоскости.
#[derive(Component, Debug)]
pub struct Dead;

/// System: применение DamageInbound событий
///
/// 1. Читаем DamageInbound
/// 2. Мутируем Health (saturating)
/// 3. Эмитим DamageTaken + HealthChanged (тот же тик, порядок источника)
/// 4. На переходе alive → dead эмитим EntityDied (ровно один раз)
pub fn apply_damage(
    mut inbound_events: EventReader<DamageInbound>,
    mut targets: Query<&mut Health>,
    mut damage_taken_events: EventWriter<DamageTaken>,
    mut health_changed_events: EventWriter<HealthChanged>,
    mut entity_died_events: EventWriter<EntityDied>,
) {
    for inbound in inbound_events.read() {
        let Ok(mut health) = targets.get_mut(inbound.target) else {
            crate::log_warning(&format!(
                "DamageInbound: target {:?} has no Health component",
                inbound.target
            ));
            continue;
        };

        let was_alive = health.is_alive();
        let previous = health.current;
        health.take_damage(inbound.amount);

        damage_taken_events.write(DamageTaken {
            target: inbound.target,
            amount: inbound.amount,
            hit_point: inbound.hit_point,
        });

        health_changed_events.write(HealthChanged {
            entity: inbound.target,
            current: health.current,
            previous,
            max: health.max,
        });

        if was_alive && !health.is_alive() {
            entity_died_events.write(EntityDied {
                entity: inbound.target,
                killer: inbound.attacker,
            });

            crate::log_info(&format!(
                "Entity {:?} destroyed by {:?}",
                inbound.target, inbound.attacker
            ));
        }
    }
}

/// System: навешивает Dead маркер на умерших
///
/// Отдельной системой (после apply_damage), чтобы маркер появился
/// тем же тиком, что и EntityDied.
pub fn mark_dead(mut commands: Commands, mut death_events: EventReader<EntityDied>) {
    for event in death_events.read() {
        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Dead);
        }
    }
}
