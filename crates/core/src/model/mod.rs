mod cabinet;
mod category_level;
mod group;
mod ids;
mod instructor;
mod option;
mod schedule;
mod student;
mod timetable;
mod user;
mod validation;
mod vehicle;

pub use ids::{
    CabinetId, CategoryLevelId, GroupId, InstructorId, ParseIdError, StudentId, UserId, VehicleId,
};

pub use cabinet::Cabinet;
pub use category_level::{CategoryLevel, CategoryLevelInfo};
pub use group::Group;
pub use instructor::Instructor;
pub use option::{SelectOption, ToOption, contains_value};
pub use schedule::{
    BatchTarget, SCHEDULES_PER_DAY_RANGE, ScheduleBatch, ScheduleBatchDraft, ScheduleError,
};
pub use student::Student;
pub use timetable::{ParseOwnerError, ScheduleEntry, ScheduleOwner};
pub use user::User;
pub use validation::{ValidationError, aggregate_message};
pub use vehicle::Vehicle;
