//! Student views: own grades and attendance per subject

use unicore::callback::{CallbackAction, MenuTarget};
use unicore::storage::{attendance, catalog, grades};

use super::helpers::{MenuContext, MenuResult};
use super::keyboards;
use crate::telegram::render;

/// Subjects of the student's group, leading to grades or attendance
pub(crate) async fn show_subjects(ctx: &MenuContext<'_>, target: MenuTarget) -> MenuResult {
    let Some(group_id) = ctx.user.group_id else {
        return ctx.show(render::NO_GROUP, keyboards::back_keyboard()).await;
    };
    let subjects = catalog::subjects_for_group(&*ctx.conn()?, group_id)?;
    if subjects.is_empty() {
        return ctx
            .show("У вашей группы пока нет предметов.", keyboards::back_keyboard())
            .await;
    }

    let (text, keyboard) = match target {
        MenuTarget::MyAttendance => (
            "Выберите предмет для просмотра посещаемости:",
            keyboards::subjects_keyboard(&subjects, |subject_id| CallbackAction::MyAttendance { subject_id }),
        ),
        _ => (
            "Выберите предмет для просмотра оценок:",
            keyboards::subjects_keyboard(&subjects, |subject_id| CallbackAction::MyGrades { subject_id }),
        ),
    };
    ctx.show(text, keyboard).await
}

pub(crate) async fn show_grades(ctx: &MenuContext<'_>, subject_id: i64) -> MenuResult {
    let found = {
        let conn = ctx.conn()?;
        match catalog::subject_by_id(&conn, subject_id)? {
            Some(subject) => Some((
                subject,
                grades::for_student_and_subject(&conn, ctx.user.id, subject_id)?,
            )),
            None => None,
        }
    };
    let Some((subject, records)) = found else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    ctx.show(
        render::grades_text(&subject.name, &records),
        keyboards::student_subject_keyboard(MenuTarget::MyGrades),
    )
    .await
}

pub(crate) async fn show_attendance(ctx: &MenuContext<'_>, subject_id: i64) -> MenuResult {
    let found = {
        let conn = ctx.conn()?;
        match catalog::subject_by_id(&conn, subject_id)? {
            Some(subject) => Some((
                subject,
                attendance::stats_for_student_and_subject(&conn, ctx.user.id, subject_id)?,
            )),
            None => None,
        }
    };
    let Some((subject, stats)) = found else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    ctx.show(
        render::attendance_text(&subject.name, &stats),
        keyboards::student_subject_keyboard(MenuTarget::MyAttendance),
    )
    .await
}
