use teloxide::prelude::*;
use unicore::callback::{CallbackAction, MenuTarget};
use unicore::storage::{Role, User};

use super::helpers::{load_user, send_notice, MenuContext, MenuResult};
use super::keyboards;
use super::main_menu::{edit_main_menu, show_role_picker, switch_role};
use super::{attendance, grades, schedule, student};
use crate::telegram::handlers::types::sender_id;
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::render;

/// Whether the role the user works in may trigger `action`
pub(crate) fn permitted(user: &User, action: &CallbackAction) -> bool {
    use CallbackAction::*;

    match action {
        RolePicker | SwitchRole(_) => user.is_super_user,
        Menu(MenuTarget::Main) | Menu(MenuTarget::Schedule) | ScheduleDay(_) => user.role != Role::SuperUser,
        Upload(_) => user.role == Role::Admin,
        Menu(MenuTarget::GradeEntry)
        | Menu(MenuTarget::AttendanceEntry)
        | GradeSubject { .. }
        | GradeGroup { .. }
        | GradePage { .. }
        | GradeStudent { .. }
        | GradeLesson { .. }
        | GradeValue { .. }
        | AttendSubject { .. }
        | AttendGroup { .. }
        | AttendLesson { .. }
        | AttendRestPresent { .. }
        | AttendAbsent { .. } => user.role == Role::Teacher,
        Menu(MenuTarget::MyGrades) | Menu(MenuTarget::MyAttendance) | MyGrades { .. } | MyAttendance { .. } => {
            user.role == Role::Student
        }
    }
}

/// Handles callback queries from the menu inline keyboards.
///
/// Unrecognized payloads and actions outside the user's role are answered and
/// dropped; failures inside a workflow are logged and reported in the chat.
pub async fn handle_menu_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let data = q.data.clone().unwrap_or_default();
    let action = match CallbackAction::parse(&data) {
        Ok(action) => action,
        Err(e) => {
            log::warn!("Callback from {}: {}", q.from.id.0, e);
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let Some(telegram_id) = sender_id(Some(&q.from)) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let user = match load_user(&deps.db_pool, telegram_id)? {
        Some(user) => user,
        None => {
            bot.answer_callback_query(q.id.clone())
                .text("Обратитесь к администратору для получения доступа.")
                .await?;
            return Ok(());
        }
    };

    if !permitted(&user, &action) {
        log::warn!("User {} ({}) may not use {}", telegram_id, user.role, action);
        bot.answer_callback_query(q.id.clone()).text(render::ACCESS_DENIED).await?;
        return Ok(());
    }
    bot.answer_callback_query(q.id.clone()).await?;
    log::info!("Callback {} from user {}", action, telegram_id);

    let ctx = MenuContext {
        bot: &bot,
        chat_id,
        message_id,
        db_pool: &deps.db_pool,
        user: &user,
    };
    if let Err(e) = route(&ctx, &deps, telegram_id, action).await {
        log::error!("Callback {} failed for user {}: {}", action, telegram_id, e);
        send_notice(&bot, chat_id, render::SOMETHING_WENT_WRONG).await;
    }
    Ok(())
}

async fn route(ctx: &MenuContext<'_>, deps: &HandlerDeps, telegram_id: i64, action: CallbackAction) -> MenuResult {
    use CallbackAction::*;

    match action {
        Upload(kind) => {
            deps.uploads.begin_expecting(telegram_id, kind);
            ctx.show(render::upload_prompt(kind), keyboards::back_keyboard()).await
        }
        Menu(MenuTarget::Main) => {
            deps.uploads.clear(telegram_id);
            edit_main_menu(ctx.bot, ctx.chat_id, ctx.message_id, ctx.user).await?;
            Ok(())
        }
        Menu(MenuTarget::Schedule) => schedule::show_schedule_day(ctx, render::today_weekday()).await,
        Menu(MenuTarget::GradeEntry) => grades::show_subjects(ctx).await,
        Menu(MenuTarget::AttendanceEntry) => attendance::show_subjects(ctx).await,
        Menu(target @ (MenuTarget::MyGrades | MenuTarget::MyAttendance)) => student::show_subjects(ctx, target).await,
        RolePicker => {
            deps.uploads.clear(telegram_id);
            show_role_picker(ctx.bot, ctx.chat_id, ctx.message_id).await?;
            Ok(())
        }
        SwitchRole(role) => switch_role(ctx.bot, ctx.chat_id, ctx.message_id, ctx.db_pool, ctx.user, role).await,
        ScheduleDay(day) => schedule::show_schedule_day(ctx, day).await,
        GradeSubject { subject_id } => grades::show_groups(ctx, subject_id).await,
        GradeGroup { subject_id, group_id } => grades::show_students(ctx, subject_id, group_id, 0).await,
        GradePage {
            subject_id,
            group_id,
            page,
        } => grades::show_students(ctx, subject_id, group_id, page).await,
        GradeStudent {
            subject_id,
            group_id,
            student_id,
        } => grades::show_lessons(ctx, subject_id, group_id, student_id).await,
        GradeLesson {
            schedule_id,
            student_id,
        } => grades::show_values(ctx, schedule_id, student_id).await,
        GradeValue {
            schedule_id,
            student_id,
            value,
        } => grades::set_grade(ctx, schedule_id, student_id, value).await,
        AttendSubject { subject_id } => attendance::show_groups(ctx, subject_id).await,
        AttendGroup { subject_id, group_id } => attendance::show_lessons(ctx, subject_id, group_id).await,
        AttendLesson {
            subject_id,
            group_id,
            schedule_id,
        } => attendance::show_unmarked(ctx, subject_id, group_id, schedule_id).await,
        AttendRestPresent {
            subject_id,
            group_id,
            schedule_id,
        } => attendance::mark_rest_present(ctx, subject_id, group_id, schedule_id).await,
        AttendAbsent {
            subject_id,
            group_id,
            schedule_id,
            student_id,
        } => attendance::mark_absent(ctx, subject_id, group_id, schedule_id, student_id).await,
        MyGrades { subject_id } => student::show_grades(ctx, subject_id).await,
        MyAttendance { subject_id } => student::show_attendance(ctx, subject_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicore::RecordKind;

    fn user(role: Role, is_super_user: bool) -> User {
        User {
            id: 1,
            external_id: Some(10),
            first_name: "A".into(),
            last_name: "B".into(),
            display_name: "A B".into(),
            role,
            group_id: Some(1),
            group_name: Some("IU7-11".into()),
            is_super_user,
        }
    }

    #[test]
    fn test_uploads_are_admin_only() {
        let action = CallbackAction::Upload(RecordKind::Students);
        assert!(permitted(&user(Role::Admin, false), &action));
        assert!(!permitted(&user(Role::Teacher, false), &action));
        assert!(!permitted(&user(Role::Student, true), &action));
    }

    #[test]
    fn test_grading_is_teacher_only() {
        let action = CallbackAction::GradeValue {
            schedule_id: 1,
            student_id: 2,
            value: 5,
        };
        assert!(permitted(&user(Role::Teacher, false), &action));
        assert!(!permitted(&user(Role::Student, false), &action));
        assert!(!permitted(&user(Role::Admin, true), &action));
    }

    #[test]
    fn test_student_views() {
        let action = CallbackAction::MyGrades { subject_id: 3 };
        assert!(permitted(&user(Role::Student, false), &action));
        assert!(!permitted(&user(Role::Teacher, false), &action));
    }

    #[test]
    fn test_role_switch_needs_super_user() {
        let action = CallbackAction::SwitchRole(Role::Admin);
        assert!(permitted(&user(Role::Student, true), &action));
        assert!(!permitted(&user(Role::Admin, false), &action));
        assert!(permitted(&user(Role::SuperUser, true), &CallbackAction::RolePicker));
    }

    #[test]
    fn test_super_user_without_role_only_picks() {
        let picking = user(Role::SuperUser, true);
        assert!(!permitted(&picking, &CallbackAction::Menu(MenuTarget::Main)));
        assert!(!permitted(&picking, &CallbackAction::ScheduleDay(1)));
    }
}
