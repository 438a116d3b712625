//! Attendance entry: subject → group → lesson → absent students

use teloxide::utils::html::escape;
use unicore::callback::{CallbackAction, MenuTarget};
use unicore::storage::{attendance, catalog, schedule};

use super::grades::{student_in_group, teachable_subjects};
use super::helpers::{MenuContext, MenuResult};
use super::keyboards;
use crate::telegram::notifications::notify_student_attendance;
use crate::telegram::render;

pub(crate) async fn show_subjects(ctx: &MenuContext<'_>) -> MenuResult {
    let subjects = teachable_subjects(&ctx.conn()?, ctx.user)?;
    if subjects.is_empty() {
        return ctx
            .show("У вас нет предметов для отметки посещаемости.", keyboards::back_keyboard())
            .await;
    }
    let keyboard = keyboards::subjects_keyboard(&subjects, |subject_id| CallbackAction::AttendSubject { subject_id });
    ctx.show("Выберите предмет для отметки посещаемости:", keyboard).await
}

pub(crate) async fn show_groups(ctx: &MenuContext<'_>, subject_id: i64) -> MenuResult {
    let groups = catalog::groups_for_subject(&*ctx.conn()?, subject_id)?;
    let text = if groups.is_empty() {
        "У данного предмета нет групп."
    } else {
        "Выберите группу:"
    };
    let keyboard = keyboards::groups_keyboard(
        &groups,
        |group_id| CallbackAction::AttendGroup { subject_id, group_id },
        CallbackAction::Menu(MenuTarget::AttendanceEntry),
    );
    ctx.show(text, keyboard).await
}

pub(crate) async fn show_lessons(ctx: &MenuContext<'_>, subject_id: i64, group_id: i64) -> MenuResult {
    let lessons = schedule::for_subject_and_group(&*ctx.conn()?, subject_id, group_id)?;
    let text = if lessons.is_empty() {
        "Нет расписания для данной группы."
    } else {
        "Выберите занятие:"
    };
    let keyboard = keyboards::lessons_keyboard(
        &lessons,
        |schedule_id| CallbackAction::AttendLesson {
            subject_id,
            group_id,
            schedule_id,
        },
        CallbackAction::AttendSubject { subject_id },
    );
    ctx.show(text, keyboard).await
}

/// Students of the lesson not marked today
pub(crate) async fn show_unmarked(ctx: &MenuContext<'_>, subject_id: i64, group_id: i64, schedule_id: i64) -> MenuResult {
    let today = render::local_now().date();
    let found = {
        let conn = ctx.conn()?;
        match schedule::by_id(&conn, schedule_id)? {
            Some(lesson) => Some((lesson, attendance::unmarked_students(&conn, group_id, schedule_id, today)?)),
            None => None,
        }
    };
    let Some((lesson, students)) = found else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };

    let label = escape(&format!("{} {}", lesson.subject_name, render::lesson_label(&lesson)));
    let text = if students.is_empty() {
        format!("Все студенты уже отмечены на занятии:\n{}", label)
    } else {
        format!("Отметьте посещаемость на занятии:\n{}\n\nВыберите отсутствующих:", label)
    };
    ctx.show(
        text,
        keyboards::absent_keyboard(&students, subject_id, group_id, schedule_id),
    )
    .await
}

pub(crate) async fn mark_absent(
    ctx: &MenuContext<'_>,
    subject_id: i64,
    group_id: i64,
    schedule_id: i64,
    student_id: i64,
) -> MenuResult {
    let today = render::local_now().date();
    let marked = {
        let conn = ctx.conn()?;
        match (schedule::by_id(&conn, schedule_id)?, student_in_group(&conn, student_id, group_id)?) {
            (Some(lesson), Some(student)) => {
                attendance::mark(&conn, student.id, schedule_id, today, false)?;
                Some((lesson, student))
            }
            _ => None,
        }
    };
    let Some((lesson, student)) = marked else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    log::info!(
        "Teacher {} marked student {} absent (schedule {}, {})",
        ctx.user.id,
        student.id,
        schedule_id,
        today
    );

    notify_student_attendance(ctx.bot, &student, &lesson, false).await;
    show_unmarked(ctx, subject_id, group_id, schedule_id).await
}

pub(crate) async fn mark_rest_present(ctx: &MenuContext<'_>, subject_id: i64, group_id: i64, schedule_id: i64) -> MenuResult {
    let today = render::local_now().date();
    let marked = {
        let mut conn = ctx.conn()?;
        let lesson = schedule::by_id(&conn, schedule_id)?;
        match lesson {
            Some(lesson) => Some((lesson, attendance::mark_rest_present(&mut conn, group_id, schedule_id, today)?)),
            None => None,
        }
    };
    let Some((lesson, students)) = marked else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    log::info!(
        "Teacher {} marked {} students present (schedule {}, {})",
        ctx.user.id,
        students.len(),
        schedule_id,
        today
    );

    for student in &students {
        notify_student_attendance(ctx.bot, student, &lesson, true).await;
    }
    ctx.show(
        format!("✅ Студенты отмечены как присутствующие!\nОтмечено: <b>{}</b>", students.len()),
        keyboards::absent_keyboard(&[], subject_id, group_id, schedule_id),
    )
    .await
}
