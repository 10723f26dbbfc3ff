//! Declarative per-resource configuration for the generic browser engine.
//!
//! Each resource supplies only data: where it lives, how it lists, which
//! filters and sort keys it accepts, its form fields and the dependency
//! edges between select fields.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use admin_core::model::{
    BatchTarget, Cabinet, CategoryLevel, Group, Instructor, SelectOption, Student, ToOption,
    Vehicle,
};
use admin_core::schema::{FieldDefault, FieldSpec};
use api::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode {
    /// `GET /api/{name}/paginated` with the full query.
    Paginated,
    /// `GET /api/{name}/`, no pagination affordances.
    Full,
}

/// Entity type an option list is projected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    CategoryLevel,
    Instructor,
    Student,
    Group,
    Cabinet,
    Vehicle,
}

impl OptionKind {
    /// Project raw rows into options.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Malformed` if a row does not decode as the entity.
    pub fn project(self, rows: Vec<Value>) -> Result<Vec<SelectOption>, ApiError> {
        rows.into_iter()
            .map(|row| match self {
                OptionKind::CategoryLevel => to_option::<CategoryLevel>(row),
                OptionKind::Instructor => to_option::<Instructor>(row),
                OptionKind::Student => to_option::<Student>(row),
                OptionKind::Group => to_option::<Group>(row),
                OptionKind::Cabinet => to_option::<Cabinet>(row),
                OptionKind::Vehicle => to_option::<Vehicle>(row),
            })
            .collect()
    }
}

fn to_option<T: DeserializeOwned + ToOption>(row: Value) -> Result<SelectOption, ApiError> {
    serde_json::from_value::<T>(row)
        .map(|entity| entity.to_option())
        .map_err(|err| ApiError::Malformed(err.to_string()))
}

/// Endpoint an option list is read from. `{parent}` in the template is
/// replaced by the parent selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionSource {
    pub template: &'static str,
    pub kind: OptionKind,
}

impl OptionSource {
    #[must_use]
    pub fn path(&self, parent: Option<u64>) -> String {
        match parent {
            Some(id) => self.template.replace("{parent}", &id.to_string()),
            None => self.template.to_string(),
        }
    }
}

pub const CATEGORY_LEVELS: OptionSource = OptionSource {
    template: "category_levels/",
    kind: OptionKind::CategoryLevel,
};
pub const ALL_GROUPS: OptionSource = OptionSource {
    template: "groups/",
    kind: OptionKind::Group,
};
pub const ALL_STUDENTS: OptionSource = OptionSource {
    template: "students/",
    kind: OptionKind::Student,
};
pub const ALL_INSTRUCTORS: OptionSource = OptionSource {
    template: "instructors/",
    kind: OptionKind::Instructor,
};
pub const GROUPS_BY_CATEGORY: OptionSource = OptionSource {
    template: "category_levels/{parent}/groups",
    kind: OptionKind::Group,
};
pub const INSTRUCTORS_BY_CATEGORY: OptionSource = OptionSource {
    template: "category_levels/{parent}/instructors",
    kind: OptionKind::Instructor,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Option list for select-style filters; `None` for flags.
    pub options: Option<OptionSource>,
}

/// `parent` select narrows the options of `child`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DependencySpec {
    pub parent: &'static str,
    pub child: &'static str,
    pub source: OptionSource,
}

/// Select field whose options do not depend on another field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticOptions {
    pub field: &'static str,
    pub source: OptionSource,
}

#[derive(Debug)]
pub struct ResourceConfig {
    /// Path segment below `/api/`.
    pub name: &'static str,
    pub title: &'static str,
    pub list: ListMode,
    pub sort_keys: &'static [&'static str],
    pub default_sort: Option<&'static str>,
    pub filters: &'static [FilterSpec],
    pub fields: &'static [FieldSpec],
    pub static_options: &'static [StaticOptions],
    pub dependencies: &'static [DependencySpec],
    pub created_message: &'static str,
    pub updated_message: &'static str,
}

impl ResourceConfig {
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&'static FilterSpec> {
        self.filters.iter().find(|filter| filter.name == name)
    }

    #[must_use]
    pub fn accepts_sort_key(&self, key: &str) -> bool {
        self.sort_keys.iter().any(|candidate| *candidate == key)
    }
}

/// A resource collection managed by the browser engine.
pub trait Resource: Send + Sync + 'static {
    type Row: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;

    fn config() -> &'static ResourceConfig;

    fn row_id(row: &Self::Row) -> u64;

    /// Schedule generation offered for a row, if any.
    fn batch_target(_row: &Self::Row) -> Option<BatchTarget> {
        None
    }
}

const CATEGORY_FILTER: FilterSpec = FilterSpec {
    name: "category_level_id",
    label: "Category level",
    options: Some(CATEGORY_LEVELS),
};
const WITHOUT_SCHEDULE_FILTER: FilterSpec = FilterSpec {
    name: "only_without_sch",
    label: "Only without schedule",
    options: None,
};
const PERSON_SORT_KEYS: &[&str] = &["last_name", "first_name", "username"];
const CATEGORY_STATIC: StaticOptions = StaticOptions {
    field: "category_level_id",
    source: CATEGORY_LEVELS,
};

// ─── STUDENTS ───────────────────────────────────────────────────────────────

pub struct Students;

static STUDENT_FIELDS: [FieldSpec; 9] = [
    FieldSpec::text("user.username", "Username"),
    FieldSpec::text("user.last_name", "Last name"),
    FieldSpec::text("user.first_name", "First name"),
    FieldSpec::optional_text("user.patronymic", "Patronymic"),
    FieldSpec::date("user.birthday", "Birthday"),
    FieldSpec::text("user.phone_number", "Phone number"),
    FieldSpec::secret("password", "Password"),
    FieldSpec::required_select(
        "category_level_id",
        "Category level",
        "Please select a category level",
    ),
    FieldSpec::required_select("group_id", "Group", "Please select a group"),
];

static STUDENTS: ResourceConfig = ResourceConfig {
    name: "students",
    title: "Students",
    list: ListMode::Paginated,
    sort_keys: PERSON_SORT_KEYS,
    default_sort: Some("last_name"),
    filters: &[CATEGORY_FILTER, WITHOUT_SCHEDULE_FILTER],
    fields: &STUDENT_FIELDS,
    static_options: &[CATEGORY_STATIC],
    dependencies: &[DependencySpec {
        parent: "category_level_id",
        child: "group_id",
        source: GROUPS_BY_CATEGORY,
    }],
    created_message: "Student added",
    updated_message: "Student`s data changed",
};

impl Resource for Students {
    type Row = Student;

    fn config() -> &'static ResourceConfig {
        &STUDENTS
    }

    fn row_id(row: &Student) -> u64 {
        row.id.value()
    }

    fn batch_target(row: &Student) -> Option<BatchTarget> {
        Some(BatchTarget::Student {
            student_id: row.id,
            category_level_id: row.category_level_id,
        })
    }
}

// ─── INSTRUCTORS ────────────────────────────────────────────────────────────

pub struct Instructors;

static INSTRUCTOR_FIELDS: [FieldSpec; 8] = [
    FieldSpec::text("user.username", "Username"),
    FieldSpec::text("user.last_name", "Last name"),
    FieldSpec::text("user.first_name", "First name"),
    FieldSpec::optional_text("user.patronymic", "Patronymic"),
    FieldSpec::date("user.birthday", "Birthday"),
    FieldSpec::text("user.phone_number", "Phone number"),
    FieldSpec::date("work_started_date", "Work started").with_default(FieldDefault::Today),
    FieldSpec::secret("password", "Password"),
];

static INSTRUCTORS: ResourceConfig = ResourceConfig {
    name: "instructors",
    title: "Instructors",
    list: ListMode::Paginated,
    sort_keys: PERSON_SORT_KEYS,
    default_sort: Some("last_name"),
    filters: &[CATEGORY_FILTER],
    fields: &INSTRUCTOR_FIELDS,
    static_options: &[],
    dependencies: &[],
    created_message: "Instructor added",
    updated_message: "Instructor`s data changed",
};

impl Resource for Instructors {
    type Row = Instructor;

    fn config() -> &'static ResourceConfig {
        &INSTRUCTORS
    }

    fn row_id(row: &Instructor) -> u64 {
        row.id.value()
    }
}

// ─── GROUPS ─────────────────────────────────────────────────────────────────

pub struct Groups;

static GROUP_FIELDS: [FieldSpec; 4] = [
    FieldSpec::text("name", "Name"),
    FieldSpec::date("created_date", "Created").with_default(FieldDefault::Today),
    FieldSpec::required_select(
        "category_level_id",
        "Category level",
        "Please select a category level.",
    ),
    FieldSpec::required_select("instructor_id", "Instructor", "Please select a instructor."),
];

static GROUPS: ResourceConfig = ResourceConfig {
    name: "groups",
    title: "Groups",
    list: ListMode::Paginated,
    sort_keys: &[],
    default_sort: None,
    filters: &[CATEGORY_FILTER, WITHOUT_SCHEDULE_FILTER],
    fields: &GROUP_FIELDS,
    static_options: &[CATEGORY_STATIC],
    dependencies: &[DependencySpec {
        parent: "category_level_id",
        child: "instructor_id",
        source: INSTRUCTORS_BY_CATEGORY,
    }],
    created_message: "Group added",
    updated_message: "Group`s data changed",
};

impl Resource for Groups {
    type Row = Group;

    fn config() -> &'static ResourceConfig {
        &GROUPS
    }

    fn row_id(row: &Group) -> u64 {
        row.id.value()
    }

    fn batch_target(row: &Group) -> Option<BatchTarget> {
        Some(BatchTarget::Group(row.id))
    }
}

// ─── VEHICLES ───────────────────────────────────────────────────────────────

pub struct Vehicles;

static VEHICLE_FIELDS: [FieldSpec; 6] = [
    FieldSpec::text("brand", "Brand"),
    FieldSpec::text("model", "Model"),
    FieldSpec::integer("manufacture_year", "Manufacture year")
        .with_default(FieldDefault::Integer(2010)),
    FieldSpec::text("license_plate", "License plate"),
    FieldSpec::text("fuel_type", "Fuel type"),
    FieldSpec::required_select(
        "category_level_id",
        "Category level",
        "Please select a category level",
    ),
];

static VEHICLES: ResourceConfig = ResourceConfig {
    name: "vehicles",
    title: "Vehicles",
    list: ListMode::Paginated,
    sort_keys: &[],
    default_sort: None,
    filters: &[CATEGORY_FILTER],
    fields: &VEHICLE_FIELDS,
    static_options: &[CATEGORY_STATIC],
    dependencies: &[],
    created_message: "Vehicle added",
    updated_message: "Vehicle`s data changed",
};

impl Resource for Vehicles {
    type Row = Vehicle;

    fn config() -> &'static ResourceConfig {
        &VEHICLES
    }

    fn row_id(row: &Vehicle) -> u64 {
        row.id.value()
    }
}

// ─── CABINETS ───────────────────────────────────────────────────────────────

pub struct Cabinets;

static CABINET_FIELDS: [FieldSpec; 1] = [FieldSpec::text("name", "Name")];

static CABINETS: ResourceConfig = ResourceConfig {
    name: "cabinets",
    title: "Cabinets",
    list: ListMode::Full,
    sort_keys: &[],
    default_sort: None,
    filters: &[],
    fields: &CABINET_FIELDS,
    static_options: &[],
    dependencies: &[],
    created_message: "Cabinet added",
    updated_message: "Cabinet`s data changed",
};

impl Resource for Cabinets {
    type Row = Cabinet;

    fn config() -> &'static ResourceConfig {
        &CABINETS
    }

    fn row_id(row: &Cabinet) -> u64 {
        row.id.value()
    }
}

// ─── CATEGORY LEVELS ────────────────────────────────────────────────────────

pub struct CategoryLevels;

static CATEGORY_LEVEL_FIELDS: [FieldSpec; 8] = [
    FieldSpec::text("category", "Category"),
    FieldSpec::text("transmission", "Transmission"),
    FieldSpec::text("description", "Description"),
    FieldSpec::integer("theory_lessons_count", "Theory lessons")
        .with_default(FieldDefault::Integer(20))
        .seeded_from("category_level_info.theory_lessons_count"),
    FieldSpec::integer("practice_lessons_count", "Practice lessons")
        .with_default(FieldDefault::Integer(20))
        .seeded_from("category_level_info.practice_lessons_count"),
    FieldSpec::text("theory_lessons_duration", "Theory lesson duration")
        .seeded_from("category_level_info.theory_lessons_duration"),
    FieldSpec::text("practice_lessons_duration", "Practice lesson duration")
        .seeded_from("category_level_info.practice_lessons_duration"),
    FieldSpec::integer("minimum_age_to_get", "Minimum age")
        .with_default(FieldDefault::Integer(18))
        .seeded_from("category_level_info.minimum_age_to_get"),
];

static CATEGORY_LEVEL_CONFIG: ResourceConfig = ResourceConfig {
    name: "category_levels",
    title: "Category levels",
    list: ListMode::Full,
    sort_keys: &[],
    default_sort: None,
    filters: &[],
    fields: &CATEGORY_LEVEL_FIELDS,
    static_options: &[],
    dependencies: &[],
    created_message: "Category level added",
    updated_message: "Category level`s data changed",
};

impl Resource for CategoryLevels {
    type Row = CategoryLevel;

    fn config() -> &'static ResourceConfig {
        &CATEGORY_LEVEL_CONFIG
    }

    fn row_id(row: &CategoryLevel) -> u64 {
        row.id.value()
    }
}

/// Names accepted on the command line, in menu order.
pub const RESOURCE_NAMES: [&str; 6] = [
    "students",
    "instructors",
    "groups",
    "vehicles",
    "cabinets",
    "category_levels",
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn option_source_substitutes_parent() {
        assert_eq!(
            GROUPS_BY_CATEGORY.path(Some(3)),
            "category_levels/3/groups"
        );
        assert_eq!(CATEGORY_LEVELS.path(None), "category_levels/");
    }

    #[test]
    fn instructor_options_use_short_names() {
        let rows = vec![json!({
            "id": 4,
            "work_started_date": "2020-01-10",
            "user": {
                "username": "petrov",
                "first_name": "Oleg",
                "last_name": "Petrov",
                "patronymic": "Ivanovich",
                "birthday": "1980-02-02",
                "phone_number": "+70000000000"
            }
        })];
        let options = OptionKind::Instructor.project(rows).unwrap();
        assert_eq!(options, vec![SelectOption::new(4, "Petrov O. I.")]);
    }

    #[test]
    fn malformed_option_rows_are_reported() {
        let err = OptionKind::Group.project(vec![json!({"id": "x"})]).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn every_dependency_child_is_a_select_field() {
        for config in [
            Students::config(),
            Instructors::config(),
            Groups::config(),
            Vehicles::config(),
            Cabinets::config(),
            CategoryLevels::config(),
        ] {
            for dep in config.dependencies {
                assert!(config.fields.iter().any(|f| f.path == dep.parent));
                assert!(config.fields.iter().any(|f| f.path == dep.child));
            }
            if let Some(sort) = config.default_sort {
                assert!(config.accepts_sort_key(sort));
            }
        }
    }
}
