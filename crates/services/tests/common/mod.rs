#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use admin_core::settings::{ClientSettings, ClientSettingsDraft};
use admin_core::time::fixed_now;
use api::memory::Reply;
use api::{ApiClient, Method, Role, ScriptedTransport, Session, SessionContext};
use services::{Clock, NotificationLog, Notifier, Resource, ResourceBrowser};

pub struct Harness {
    pub transport: ScriptedTransport,
    pub api: ApiClient,
    pub notes: NotificationLog,
    pub settings: ClientSettings,
    pub clock: Clock,
}

impl Harness {
    pub fn new() -> Self {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Get,
            "/api/category_levels/",
            Reply::ok(json!([
                category_level_row(1, "B", "manual"),
                category_level_row(2, "B", "auto")
            ])),
        );
        let api = ApiClient::new(
            Arc::new(transport.clone()),
            SessionContext::signed_in(Session::with_role("admin-token", Role::Admin)),
        );
        let settings = ClientSettingsDraft {
            debounce_ms: Some("300".into()),
            ..ClientSettingsDraft::default()
        }
        .validate()
        .expect("valid settings");
        Self {
            transport,
            api,
            notes: NotificationLog::new(),
            settings,
            clock: Clock::fixed(fixed_now()),
        }
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(self.notes.clone())
    }

    pub fn browser<R: Resource>(&self) -> ResourceBrowser<R> {
        ResourceBrowser::new(self.api.clone(), self.notifier(), &self.settings, self.clock)
            .expect("acyclic dependencies")
    }
}

pub fn user(username: &str, last_name: &str) -> Value {
    json!({
        "username": username,
        "first_name": "Ivan",
        "last_name": last_name,
        "patronymic": null,
        "birthday": "2001-05-06",
        "phone_number": "+70000000001"
    })
}

pub fn student_row(id: u64, last_name: &str, category_level_id: u64, group_id: u64) -> Value {
    json!({
        "id": id,
        "user": user(&format!("student{id}"), last_name),
        "category_level_id": category_level_id,
        "group_id": group_id,
        "has_schedule": false
    })
}

pub fn students(count: u64, prefix: &str) -> Value {
    Value::Array(
        (1..=count)
            .map(|id| student_row(id, &format!("{prefix}{id}"), 1, 1))
            .collect(),
    )
}

pub fn group_row(id: u64, name: &str, category_level_id: u64, instructor_id: u64) -> Value {
    json!({
        "id": id,
        "name": name,
        "created_date": "2023-09-01",
        "category_level_id": category_level_id,
        "instructor_id": instructor_id
    })
}

pub fn instructor_row(id: u64, last_name: &str) -> Value {
    json!({
        "id": id,
        "work_started_date": "2015-03-01",
        "user": user(&format!("instructor{id}"), last_name)
    })
}

pub fn category_level_row(id: u64, category: &str, transmission: &str) -> Value {
    json!({
        "id": id,
        "category": category,
        "transmission": transmission,
        "description": "",
        "category_level_info": {
            "theory_lessons_count": 20,
            "practice_lessons_count": 20,
            "theory_lessons_duration": "02:00:00",
            "practice_lessons_duration": "02:00:00",
            "minimum_age_to_get": 18
        }
    })
}
