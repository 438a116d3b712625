//! Weekday schedule view

use unicore::storage::schedule::{self, ScheduleFilter};
use unicore::storage::{Role, User};

use super::helpers::{MenuContext, MenuResult};
use super::keyboards;
use crate::telegram::render;

/// Lessons the user should see, by the role they work in
pub(crate) fn filter_for(user: &User) -> Option<ScheduleFilter> {
    match user.role {
        Role::Student => user.group_id.map(ScheduleFilter::Group),
        Role::Teacher => Some(ScheduleFilter::Teacher(user.id)),
        Role::Admin | Role::SuperUser => Some(ScheduleFilter::All),
    }
}

pub(crate) async fn show_schedule_day(ctx: &MenuContext<'_>, day: u8) -> MenuResult {
    let text = match filter_for(ctx.user) {
        Some(filter) => {
            let conn = ctx.conn()?;
            let entries = schedule::for_weekday(&conn, filter, day)?;
            render::schedule_text(day, &entries)
        }
        None => render::NO_GROUP.to_string(),
    };
    ctx.show(text, keyboards::schedule_keyboard(day)).await
}
