//! Gameplay plane — 2D координатная плоскость, встроенная в 3D мир
//!
//! Вся боевая геометрия (корабли, астероиды, прицеливание) считается на одной
//! абстрактной плоскости. PlaneFrame — чистая математика конвертации,
//! GameplayPlane — process-scoped resource с lazy fallback:
//! 1. Явная установка через set_reference_plane (перезаписывает безусловно)
//! 2. Иначе — первый PlaneAnchor entity в мире
//! 3. Иначе — дефолтный frame в origin (+Z normal, +Y forward, +X right)
//!
//! Отсутствие настроенной плоскости НЕ ошибка — всегда разрешается fallback'ом.

use bevy::prelude::*;

/// Marker: entity, чей Transform задаёт gameplay plane
///
/// Аналог tagged-объекта сцены. Используется только если frame
/// не был установлен явно до первого обращения.
#[derive(Component, Debug, Default, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PlaneAnchor;

/// 2D координатный frame в 3D пространстве
///
/// Инвариант: right, forward, normal — взаимно ортогональные единичные
/// векторы, правая тройка (right × forward = normal).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PlaneFrame {
    pub origin: Vec3,
    pub normal: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
}

impl Default for PlaneFrame {
    /// Fallback frame: мировой origin, +Z normal, +Y forward, +X right
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            normal: Vec3::Z,
            forward: Vec3::Y,
            right: Vec3::X,
        }
    }
}

impl PlaneFrame {
    /// Строит frame из origin + normal + forward-подсказки.
    ///
    /// Входные векторы ортонормализуются: forward очищается от компоненты
    /// вдоль normal, right достраивается до правой тройки.
    pub fn new(origin: Vec3, normal: Vec3, forward: Vec3) -> Self {
        let normal = normal.normalize();
        let forward = (forward - normal * forward.dot(normal)).normalize();
        let right = forward.cross(normal);
        Self {
            origin,
            normal,
            forward,
            right,
        }
    }

    /// Frame из Transform anchor-entity (rotation задаёт оси)
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            origin: transform.translation,
            normal: transform.rotation * Vec3::Z,
            forward: transform.rotation * Vec3::Y,
            right: transform.rotation * Vec3::X,
        }
    }

    /// Мировая точка → координаты на плоскости
    pub fn world_to_plane(&self, world_point: Vec3) -> Vec2 {
        let offset = world_point - self.origin;
        Vec2::new(offset.dot(self.right), offset.dot(self.forward))
    }

    /// Координаты на плоскости → мировая точка (лежит в плоскости)
    ///
    /// Левая инверсия world_to_plane только для точек В плоскости.
    /// Для точки вне плоскости round-trip даёт её ортогональную проекцию —
    /// это документированное lossy-поведение, не баг.
    pub fn plane_to_world(&self, plane_point: Vec2) -> Vec3 {
        self.origin + self.right * plane_point.x + self.forward * plane_point.y
    }

    /// Ортогональная проекция мировой точки на плоскость
    pub fn project_onto_plane(&self, world_point: Vec3) -> Vec3 {
        world_point - self.normal * (world_point - self.origin).dot(self.normal)
    }

    /// Направление (без origin-смещения): для скоростей и сил
    pub fn plane_vector_to_world(&self, plane_vector: Vec2) -> Vec3 {
        self.right * plane_vector.x + self.forward * plane_vector.y
    }
}

/// Process-scoped кэш gameplay plane
///
/// Lifecycle: ноль или один активный frame на World. Резолвится лениво
/// системой resolve_gameplay_plane; повторная явная установка перезаписывает.
#[derive(Resource, Debug, Default)]
pub struct GameplayPlane {
    frame: Option<PlaneFrame>,
}

impl GameplayPlane {
    /// Безусловно заменяет активный frame
    pub fn set_reference_plane(&mut self, frame: PlaneFrame) {
        self.frame = Some(frame);
    }

    /// Текущий frame; дефолтный если резолв ещё не прошёл.
    ///
    /// Никогда не fail'ится — отсутствие конфигурации закрывается fallback'ом.
    pub fn current(&self) -> PlaneFrame {
        self.frame.unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.frame.is_some()
    }

    fn cache(&mut self, frame: PlaneFrame) {
        if self.frame.is_none() {
            self.frame = Some(frame);
        }
    }
}

/// System: lazy-резолв gameplay plane
///
/// Если frame не закэширован — ищем PlaneAnchor, иначе кэшируем дефолт.
/// После кэширования идемпотентна: позже заспавненный anchor НЕ заменяет
/// уже разрешённый frame (замена только через set_reference_plane).
pub fn resolve_gameplay_plane(
    mut plane: ResMut<GameplayPlane>,
    anchors: Query<&Transform, With<PlaneAnchor>>,
) {
    if plane.is_resolved() {
        return;
    }

    let frame = match anchors.iter().next() {
        Some(transform) => PlaneFrame::from_transform(transform),
        None => PlaneFrame::default(),
    };
    plane.cache(frame);

    crate::log(&format!(
        "Gameplay plane resolved: origin={:?} normal={:?}",
        frame.origin, frame.normal
    ));
}

/// Plugin: регистрирует GameplayPlane resource + резолв
pub struct PlanePlugin;

impl Plugin for PlanePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameplayPlane>()
            .add_systems(Update, resolve_gameplay_plane.in_set(crate::SimSet::Plane));
    }
}
