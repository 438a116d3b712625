//! Inline keyboards
//!
//! Every button carries an encoded [`CallbackAction`], so anything built here
//! parses back in the callback router.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use unicore::callback::{CallbackAction, MenuTarget};
use unicore::pagination::Page;
use unicore::storage::catalog::{Group, Subject};
use unicore::storage::schedule::ScheduleEntry;
use unicore::storage::{Role, User};
use unicore::RecordKind;

use crate::telegram::render;

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.encode())
}

fn back_to_main() -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ Главное меню", CallbackAction::Menu(MenuTarget::Main))]
}

fn back_to(text: &str, action: CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![button(text, action)]
}

/// Main menu for the role the user currently works in
pub fn main_menu_keyboard(user: &User) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = match user.role {
        Role::Admin => vec![
            vec![button("📥 Загрузить студентов", CallbackAction::Upload(RecordKind::Students))],
            vec![button(
                "📥 Загрузить преподавателей",
                CallbackAction::Upload(RecordKind::Teachers),
            )],
            vec![button("📥 Загрузить расписание", CallbackAction::Upload(RecordKind::Schedule))],
        ],
        Role::Teacher => vec![
            vec![button("📅 Расписание", CallbackAction::Menu(MenuTarget::Schedule))],
            vec![button("📝 Выставить оценку", CallbackAction::Menu(MenuTarget::GradeEntry))],
            vec![button(
                "📋 Отметить посещаемость",
                CallbackAction::Menu(MenuTarget::AttendanceEntry),
            )],
        ],
        Role::Student => vec![
            vec![button("📅 Расписание", CallbackAction::Menu(MenuTarget::Schedule))],
            vec![button("📊 Мои оценки", CallbackAction::Menu(MenuTarget::MyGrades))],
            vec![button("📈 Моя посещаемость", CallbackAction::Menu(MenuTarget::MyAttendance))],
        ],
        Role::SuperUser => return role_picker_keyboard(),
    };
    if user.is_super_user {
        rows.push(vec![button("🔄 Сменить роль", CallbackAction::RolePicker)]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn role_picker_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("👨‍💼 Администратор", CallbackAction::SwitchRole(Role::Admin))],
        vec![button("👨‍🏫 Преподаватель", CallbackAction::SwitchRole(Role::Teacher))],
        vec![button("🎓 Студент", CallbackAction::SwitchRole(Role::Student))],
    ])
}

/// Only a way back, used under notices and upload prompts
pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_to_main()])
}

/// Day switcher; the labels name the day the button leads to
pub fn schedule_keyboard(day: u8) -> InlineKeyboardMarkup {
    let prev = render::prev_day(day);
    let next = render::next_day(day);
    InlineKeyboardMarkup::new(vec![
        vec![
            button(format!("◀️ {}", render::weekday_name(prev)), CallbackAction::ScheduleDay(prev)),
            button(format!("{} ▶️", render::weekday_name(next)), CallbackAction::ScheduleDay(next)),
        ],
        back_to_main(),
    ])
}

/// One button per subject, `action` builds the payload from the subject id
pub fn subjects_keyboard(subjects: &[Subject], action: impl Fn(i64) -> CallbackAction) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = subjects
        .iter()
        .map(|s| vec![button(s.name.clone(), action(s.id))])
        .collect();
    rows.push(back_to_main());
    InlineKeyboardMarkup::new(rows)
}

pub fn groups_keyboard(
    groups: &[Group],
    action: impl Fn(i64) -> CallbackAction,
    back: CallbackAction,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
        .iter()
        .map(|g| vec![button(g.name.clone(), action(g.id))])
        .collect();
    rows.push(back_to("⬅️ К предметам", back));
    InlineKeyboardMarkup::new(rows)
}

pub fn lessons_keyboard(
    lessons: &[ScheduleEntry],
    action: impl Fn(i64) -> CallbackAction,
    back: CallbackAction,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = lessons
        .iter()
        .map(|l| vec![button(render::lesson_label(l), action(l.id))])
        .collect();
    rows.push(back_to("⬅️ Назад", back));
    InlineKeyboardMarkup::new(rows)
}

/// Students of a group for grade entry, with page navigation
pub fn students_page_keyboard(page: &Page<'_, User>, subject_id: i64, group_id: i64) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = page
        .items
        .iter()
        .map(|s| {
            vec![button(
                s.roster_name(),
                CallbackAction::GradeStudent {
                    subject_id,
                    group_id,
                    student_id: s.id,
                },
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_prev() {
        nav.push(button(
            "◀️",
            CallbackAction::GradePage {
                subject_id,
                group_id,
                page: page.page - 1,
            },
        ));
    }
    if page.has_next() {
        nav.push(button(
            "▶️",
            CallbackAction::GradePage {
                subject_id,
                group_id,
                page: page.page + 1,
            },
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(back_to("⬅️ К группам", CallbackAction::GradeSubject { subject_id }));
    InlineKeyboardMarkup::new(rows)
}

/// Grade scale as a single row
pub fn grade_values_keyboard(schedule_id: i64, student_id: i64, back: CallbackAction) -> InlineKeyboardMarkup {
    let values = (0..=5u8)
        .map(|value| {
            button(
                value.to_string(),
                CallbackAction::GradeValue {
                    schedule_id,
                    student_id,
                    value,
                },
            )
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![values, back_to("⬅️ Назад", back)])
}

/// Shown after a grade is stored
pub fn after_grade_keyboard(subject_id: i64, group_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(
            "📝 Выставить ещё",
            CallbackAction::GradeGroup { subject_id, group_id },
        )],
        back_to_main(),
    ])
}

/// Unmarked students of a lesson; tapping one marks them absent
pub fn absent_keyboard(students: &[User], subject_id: i64, group_id: i64, schedule_id: i64) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = students
        .iter()
        .map(|s| {
            vec![button(
                format!("❌ {}", s.roster_name()),
                CallbackAction::AttendAbsent {
                    subject_id,
                    group_id,
                    schedule_id,
                    student_id: s.id,
                },
            )]
        })
        .collect();
    if !students.is_empty() {
        rows.push(vec![button(
            "✅ Отметить всех остальных присутствующими",
            CallbackAction::AttendRestPresent {
                subject_id,
                group_id,
                schedule_id,
            },
        )]);
    }
    rows.push(back_to("⬅️ К занятиям", CallbackAction::AttendGroup { subject_id, group_id }));
    InlineKeyboardMarkup::new(rows)
}

/// Button under a grade notification
pub fn view_grades_keyboard(subject_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "📊 Посмотреть оценки",
        CallbackAction::MyGrades { subject_id },
    )]])
}

/// Under a student's grades or attendance view
pub fn student_subject_keyboard(back: MenuTarget) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        back_to("⬅️ К предметам", CallbackAction::Menu(back)),
        back_to_main(),
    ])
}
