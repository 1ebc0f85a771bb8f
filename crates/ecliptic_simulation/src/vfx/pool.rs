//! Effect pool — переиспользование короткоживущих визуальных эффектов
//!
//! Инстансы никогда не деспавнятся, пока жив пул: release деактивирует
//! и возвращает в free list своего шаблона, acquire реактивирует и
//! репозиционирует. Набор шаблонов открытый — новый путь допускается
//! при первом acquire. Ёмкость не ограничена и не вытесняется
//! (осознанный trade-off, см. DESIGN.md).

use bevy::prelude::*;
use std::collections::HashMap;

/// Описание шаблона эффекта
///
/// Identity — путь клиентского ресурса (ключ пула, тот же формат,
/// что у prefab-путей игровых объектов).
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct EffectTemplate {
    /// Stable identity шаблона (ключ пула)
    pub effect_path: String,

    /// Время жизни инстанса: Some = time-boxed burst (авто-release),
    /// None = looping эффект, release вручную
    pub duration: Option<f32>,
}

impl EffectTemplate {
    /// Time-boxed burst (искры, взрыв): сам вернётся в пул
    pub fn one_shot(effect_path: impl Into<String>, duration: f32) -> Self {
        Self {
            effect_path: effect_path.into(),
            duration: Some(duration),
        }
    }

    /// Looping эффект без авто-release
    pub fn looping(effect_path: impl Into<String>) -> Self {
        Self {
            effect_path: effect_path.into(),
            duration: None,
        }
    }
}

/// Компонент pooled-инстанса
///
/// Поза живёт в Transform entity. active дублирует членство
/// в live-set пула — для клиентского слоя (показывать/скрывать).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct PooledEffect {
    pub effect_path: String,
    pub active: bool,
}

/// Таймер авто-release time-boxed эффектов
#[derive(Component, Debug)]
pub struct EffectLifetime {
    pub timer: Timer,
}

impl EffectLifetime {
    pub fn new(duration: f32) -> Self {
        Self {
            timer: Timer::from_seconds(duration, TimerMode::Once),
        }
    }
}

/// Пул инстансов по шаблонам
///
/// free: неактивные инстансы на шаблон; live: активные → их шаблон.
/// Мутируется только из schedule — синхронизация не нужна.
#[derive(Resource, Debug, Default)]
pub struct EffectPool {
    free: HashMap<String, Vec<Entity>>,
    live: HashMap<Entity, String>,
}

impl EffectPool {
    /// Выдаёт инстанс шаблона: из free list, иначе спавнит новый.
    ///
    /// Гарантия: entity из live-set никогда не выдаётся повторно —
    /// два держателя не получат один активный handle.
    pub fn acquire(
        &mut self,
        commands: &mut Commands,
        template: &EffectTemplate,
        position: Vec3,
        rotation: Quat,
    ) -> Entity {
        let pose = Transform {
            translation: position,
            rotation,
            ..Default::default()
        };
        let instance = PooledEffect {
            effect_path: template.effect_path.clone(),
            active: true,
        };

        let entity = match self
            .free
            .get_mut(&template.effect_path)
            .and_then(|list| list.pop())
        {
            Some(entity) => {
                // Reuse: реактивация + новая поза, без аллокации
                let mut entity_commands = commands.entity(entity);
                entity_commands.insert((pose, instance));
                if let Some(duration) = template.duration {
                    entity_commands.insert(EffectLifetime::new(duration));
                }
                entity
            }
            None => {
                // Первый запрос шаблона без свободных инстансов — новый entity
                let mut entity_commands = commands.spawn((pose, instance));
                if let Some(duration) = template.duration {
                    entity_commands.insert(EffectLifetime::new(duration));
                }
                entity_commands.id()
            }
        };

        self.live.insert(entity, template.effect_path.clone());
        entity
    }

    /// Деактивирует инстанс и возвращает в free list его шаблона.
    ///
    /// Release не-живого handle — no-op, не ошибка.
    pub fn release(&mut self, commands: &mut Commands, entity: Entity) {
        let Some(effect_path) = self.live.remove(&entity) else {
            return;
        };

        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.insert(PooledEffect {
                effect_path: effect_path.clone(),
                active: false,
            });
            entity_commands.remove::<EffectLifetime>();
        }

        self.free.entry(effect_path).or_default().push(entity);
    }

    pub fn is_live(&self, entity: Entity) -> bool {
        self.live.contains_key(&entity)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self, effect_path: &str) -> usize {
        self.free.get(effect_path).map_or(0, Vec::len)
    }
}

/// System: авто-release отработавших time-boxed эффектов
///
/// Держатель burst-эффекта не обязан отслеживать завершение —
/// инстанс сам возвращается в пул.
pub fn release_finished_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut pool: ResMut<EffectPool>,
    mut effects: Query<(Entity, &mut EffectLifetime)>,
) {
    for (entity, mut lifetime) in effects.iter_mut() {
        lifetime.timer.tick(time.delta());
        if lifetime.timer.finished() {
            pool.release(&mut commands, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::world::CommandQueue;

    fn spark_template() -> EffectTemplate {
        EffectTemplate::one_shot("res://fx/spark_burst.tscn", 0.8)
    }

    /// Helper: acquire через отложенную CommandQueue + apply
    fn acquire_applied(
        world: &mut World,
        pool: &mut EffectPool,
        template: &EffectTemplate,
    ) -> Entity {
        let mut queue = CommandQueue::default();
        let mut commands = Commands::new(&mut queue, world);
        let entity = pool.acquire(&mut commands, template, Vec3::ZERO, Quat::IDENTITY);
        queue.apply(world);
        entity
    }

    fn release_applied(world: &mut World, pool: &mut EffectPool, entity: Entity) {
        let mut queue = CommandQueue::default();
        let mut commands = Commands::new(&mut queue, world);
        pool.release(&mut commands, entity);
        queue.apply(world);
    }

    #[test]
    fn test_acquire_spawns_and_marks_live() {
        let mut world = World::new();
        let mut pool = EffectPool::default();

        let entity = acquire_applied(&mut world, &mut pool, &spark_template());

        assert!(pool.is_live(entity));
        assert_eq!(pool.live_count(), 1);
        let effect = world.get::<PooledEffect>(entity).unwrap();
        assert!(effect.active);
        assert!(world.get::<EffectLifetime>(entity).is_some());
    }

    #[test]
    fn test_no_double_use() {
        let mut world = World::new();
        let mut pool = EffectPool::default();
        let template = spark_template();

        let first = acquire_applied(&mut world, &mut pool, &template);
        let second = acquire_applied(&mut world, &mut pool, &template);

        // Два держателя — два разных инстанса
        assert_ne!(first, second);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_release_then_reuse_same_instances() {
        let mut world = World::new();
        let mut pool = EffectPool::default();
        let template = spark_template();

        // Раунд 1: N инстансов из пустого пула
        let mut round1 = Vec::new();
        for _ in 0..3 {
            round1.push(acquire_applied(&mut world, &mut pool, &template));
        }
        for &entity in &round1 {
            release_applied(&mut world, &mut pool, entity);
        }
        assert_eq!(pool.free_count(&template.effect_path), 3);
        assert_eq!(pool.live_count(), 0);

        // Раунд 2: те же N entity, без новых аллокаций
        let mut round2 = Vec::new();
        for _ in 0..3 {
            round2.push(acquire_applied(&mut world, &mut pool, &template));
        }
        round1.sort();
        round2.sort();
        assert_eq!(round1, round2);
        assert_eq!(pool.free_count(&template.effect_path), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut world = World::new();
        let mut pool = EffectPool::default();

        let entity = acquire_applied(&mut world, &mut pool, &spark_template());
        release_applied(&mut world, &mut pool, entity);
        release_applied(&mut world, &mut pool, entity); // Повторный release — no-op

        assert_eq!(pool.free_count("res://fx/spark_burst.tscn"), 1);
        let effect = world.get::<PooledEffect>(entity).unwrap();
        assert!(!effect.active);
    }

    #[test]
    fn test_open_template_set() {
        let mut world = World::new();
        let mut pool = EffectPool::default();

        // Новые шаблоны допускаются на первом acquire
        let spark = acquire_applied(&mut world, &mut pool, &spark_template());
        let boom = acquire_applied(
            &mut world,
            &mut pool,
            &EffectTemplate::one_shot("res://fx/ship_explosion.tscn", 2.5),
        );

        release_applied(&mut world, &mut pool, spark);
        release_applied(&mut world, &mut pool, boom);

        // Free lists раздельные по шаблону
        assert_eq!(pool.free_count("res://fx/spark_burst.tscn"), 1);
        assert_eq!(pool.free_count("res://fx/ship_explosion.tscn"), 1);
    }

    #[test]
    fn test_looping_template_has_no_lifetime() {
        let mut world = World::new();
        let mut pool = EffectPool::default();

        let entity = acquire_applied(
            &mut world,
            &mut pool,
            &EffectTemplate::looping("res://fx/damage_smoke.tscn"),
        );
        assert!(world.get::<EffectLifetime>(entity).is_none());
    }
}
