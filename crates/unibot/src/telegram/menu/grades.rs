//! Grade entry: subject → group → student → lesson → value

use teloxide::utils::html::escape;
use unicore::callback::{CallbackAction, MenuTarget};
use unicore::config;
use unicore::pagination::paginate;
use unicore::storage::catalog::{self, Subject};
use unicore::storage::{grades, schedule, users, DbConnection, User};
use unicore::AppResult;

use super::helpers::{MenuContext, MenuResult};
use super::keyboards;
use crate::telegram::notifications::notify_student_grade;
use crate::telegram::render;

/// Subjects a user may grade or mark; super users work with all of them
pub(crate) fn teachable_subjects(conn: &DbConnection, user: &User) -> AppResult<Vec<Subject>> {
    let subjects = if user.is_super_user {
        catalog::all_subjects(conn)?
    } else {
        catalog::subjects_for_teacher(conn, user.id)?
    };
    Ok(subjects)
}

/// Loads a student only if they belong to `group_id`
pub(crate) fn student_in_group(conn: &DbConnection, student_id: i64, group_id: i64) -> AppResult<Option<User>> {
    Ok(users::find_by_id(conn, student_id)?.filter(|s| s.group_id == Some(group_id)))
}

pub(crate) async fn show_subjects(ctx: &MenuContext<'_>) -> MenuResult {
    let subjects = teachable_subjects(&ctx.conn()?, ctx.user)?;
    if subjects.is_empty() {
        return ctx
            .show("У вас нет предметов для выставления оценок.", keyboards::back_keyboard())
            .await;
    }
    let keyboard = keyboards::subjects_keyboard(&subjects, |subject_id| CallbackAction::GradeSubject { subject_id });
    ctx.show("Выберите предмет:", keyboard).await
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
        |group_id| CallbackAction::GradeGroup { subject_id, group_id },
        CallbackAction::Menu(MenuTarget::GradeEntry),
    );
    ctx.show(text, keyboard).await
}

pub(crate) async fn show_students(ctx: &MenuContext<'_>, subject_id: i64, group_id: i64, page: usize) -> MenuResult {
    let students = users::students_in_group(&*ctx.conn()?, group_id)?;
    let page = paginate(&students, page, config::pagination::STUDENTS_PER_PAGE);
    let text = if students.is_empty() {
        "В группе нет студентов.".to_string()
    } else {
        format!("Выберите студента (страница {}/{}):", page.page + 1, page.total_pages)
    };
    ctx.show(text, keyboards::students_page_keyboard(&page, subject_id, group_id))
        .await
}

pub(crate) async fn show_lessons(ctx: &MenuContext<'_>, subject_id: i64, group_id: i64, student_id: i64) -> MenuResult {
    let lessons = schedule::for_subject_and_group(&*ctx.conn()?, subject_id, group_id)?;
    let text = if lessons.is_empty() {
        "Нет расписания для данной группы."
    } else {
        "Выберите занятие:"
    };
    let keyboard = keyboards::lessons_keyboard(
        &lessons,
        |schedule_id| CallbackAction::GradeLesson {
            schedule_id,
            student_id,
        },
        CallbackAction::GradeGroup { subject_id, group_id },
    );
    ctx.show(text, keyboard).await
}

pub(crate) async fn show_values(ctx: &MenuContext<'_>, schedule_id: i64, student_id: i64) -> MenuResult {
    let found = {
        let conn = ctx.conn()?;
        match schedule::by_id(&conn, schedule_id)? {
            Some(lesson) => student_in_group(&conn, student_id, lesson.group_id)?.map(|s| (lesson, s)),
            None => None,
        }
    };
    let Some((lesson, student)) = found else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    let keyboard = keyboards::grade_values_keyboard(
        schedule_id,
        student_id,
        CallbackAction::GradeStudent {
            subject_id: lesson.subject_id,
            group_id: lesson.group_id,
            student_id,
        },
    );
    ctx.show(
        format!(
            "Выберите оценку для студента {}:\n{}",
            escape(&student.roster_name()),
            escape(&render::lesson_label(&lesson))
        ),
        keyboard,
    )
    .await
}

/// Stores the grade and tells the student
pub(crate) async fn set_grade(ctx: &MenuContext<'_>, schedule_id: i64, student_id: i64, value: u8) -> MenuResult {
    let stored = {
        let conn = ctx.conn()?;
        match schedule::by_id(&conn, schedule_id)? {
            Some(lesson) => match student_in_group(&conn, student_id, lesson.group_id)? {
                Some(student) => {
                    grades::insert_grade(&conn, student.id, schedule_id, ctx.user.id, i64::from(value))?;
                    Some((lesson, student))
                }
                None => None,
            },
            None => None,
        }
    };
    let Some((lesson, student)) = stored else {
        return ctx.show(render::STALE_BUTTON, keyboards::back_keyboard()).await;
    };
    log::info!(
        "Teacher {} set grade {} for student {} (schedule {})",
        ctx.user.id,
        value,
        student.id,
        schedule_id
    );

    notify_student_grade(ctx.bot, &student, lesson.subject_id, &lesson.subject_name, i64::from(value)).await;
    ctx.show(
        format!(
            "✅ Оценка {} успешно выставлена студенту {} по предмету {}!",
            value,
            escape(&student.roster_name()),
            escape(&lesson.subject_name)
        ),
        keyboards::after_grade_keyboard(lesson.subject_id, lesson.group_id),
    )
    .await
}
