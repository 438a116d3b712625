//! Chat texts (HTML parse mode)
//!
//! Everything here is pure so it can be tested without a bot.

use chrono::{Datelike, Duration, NaiveDateTime, Utc};
use itertools::Itertools;
use teloxide::utils::html::escape;
use unicore::config;
use unicore::import::{ImportError, RecordKind, StructuralError};
use unicore::storage::attendance::AttendanceStats;
use unicore::storage::grades::{GradeRecord, GradeSummary};
use unicore::storage::schedule::ScheduleEntry;
use unicore::storage::Role;
use unicore::upload::UploadOutcome;

const WEEKDAYS: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];

const WEEKDAYS_SHORT: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

pub const UNKNOWN_MESSAGE: &str = "❓ Я не понимаю это сообщение.";
pub const CHOOSE_ROLE: &str = "Добро пожаловать! Выберите свою роль:";
pub const ACCESS_DENIED: &str = "Это действие недоступно для вашей роли.";
pub const NO_GROUP: &str = "Вы не привязаны к учебной группе. Обратитесь к администратору.";
pub const STALE_BUTTON: &str = "Данные устарели, откройте меню заново.";
pub const SOMETHING_WENT_WRONG: &str = "⚠️ Что-то пошло не так. Попробуйте ещё раз.";

pub fn weekday_name(day: u8) -> &'static str {
    match day {
        1..=7 => WEEKDAYS[usize::from(day - 1)],
        _ => "?",
    }
}

fn weekday_short(day: u8) -> &'static str {
    match day {
        1..=7 => WEEKDAYS_SHORT[usize::from(day - 1)],
        _ => "?",
    }
}

/// Previous weekday, Monday wraps to Sunday
pub fn prev_day(day: u8) -> u8 {
    if day <= 1 {
        7
    } else {
        day - 1
    }
}

/// Next weekday, Sunday wraps to Monday
pub fn next_day(day: u8) -> u8 {
    if day >= 7 {
        1
    } else {
        day + 1
    }
}

/// Shifts a stored UTC timestamp to the display time zone
pub fn to_local(utc: NaiveDateTime) -> NaiveDateTime {
    utc + Duration::hours(i64::from(*config::DISPLAY_UTC_OFFSET_HOURS))
}

pub fn local_now() -> NaiveDateTime {
    to_local(Utc::now().naive_utc())
}

/// Weekday number (1 = Monday) in the display time zone
pub fn today_weekday() -> u8 {
    local_now().weekday().number_from_monday() as u8
}

pub fn welcome_text(role: Role) -> &'static str {
    match role {
        Role::Admin => "Добро пожаловать, администратор! 👨‍💼",
        Role::Teacher => "Добро пожаловать, преподаватель! 👨‍🏫",
        Role::Student => "Добро пожаловать, студент! 🎓",
        Role::SuperUser => CHOOSE_ROLE,
    }
}

pub fn main_menu_text(role: Role) -> &'static str {
    match role {
        Role::Admin => "Главное меню администратора:",
        Role::Teacher => "Главное меню преподавателя:",
        Role::Student => "Главное меню студента:",
        Role::SuperUser => CHOOSE_ROLE,
    }
}

pub fn unknown_user_text(telegram_id: i64) -> String {
    format!(
        "Привет! 👋 Я бот цифрового университета.\n\nВаш ID: <code>{}</code>\nОбратитесь к администратору для получения доступа.",
        telegram_id
    )
}

pub fn whoami_text(telegram_id: i64) -> String {
    format!("Ваш Telegram ID: <code>{}</code>", telegram_id)
}

pub fn upload_prompt(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Students => "Отправьте файл со списком студентов (с расширением .csv).",
        RecordKind::Teachers => "Отправьте файл с преподавателями (с расширением .csv).",
        RecordKind::Schedule => "Отправьте файл с расписанием (с расширением .csv).",
    }
}

/// Short button label of a lesson, e.g. "Пн 09:00 Лекция"
pub fn lesson_label(entry: &ScheduleEntry) -> String {
    format!("{} {} {}", weekday_short(entry.weekday), entry.start_time, entry.lesson_type)
}

pub fn schedule_text(day: u8, entries: &[ScheduleEntry]) -> String {
    let title = format!("📅 <b>{}</b>", weekday_name(day));
    if entries.is_empty() {
        return format!("{}\n\nНет занятий.", title);
    }
    let body = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{}. <b>{}</b> ({})\n   👨‍🏫 {}\n   👥 {}\n   🏫 {}\n   ⏰ {}–{}",
                i + 1,
                escape(&e.subject_name),
                escape(&e.lesson_type),
                escape(&e.teacher_name),
                escape(&e.group_name),
                escape(&e.classroom),
                escape(&e.start_time),
                escape(&e.end_time),
            )
        })
        .join("\n\n");
    format!("{}\n\n{}", title, body)
}

pub fn grades_text(subject_name: &str, grades: &[GradeRecord]) -> String {
    let subject = escape(subject_name);
    if grades.is_empty() {
        return format!("По предмету <b>{}</b> оценок пока нет.", subject);
    }
    let lines = grades
        .iter()
        .map(|g| {
            format!(
                "<code>{}</code> {}: <b>{}</b>",
                to_local(g.created_at).format("%d.%m.%Y %H:%M"),
                escape(&g.lesson_type),
                g.value
            )
        })
        .join("\n");
    let summary = GradeSummary::of(grades);
    format!(
        "📊 Оценки по предмету <b>{}</b>:\n\n{}\n\n📈 <b>Статистика:</b>\n• Всего оценок: <b>{}</b>\n• Средний балл: <b>{:.2}</b>",
        subject,
        lines,
        summary.count,
        summary.average.unwrap_or_default()
    )
}

pub fn attendance_text(subject_name: &str, stats: &AttendanceStats) -> String {
    let subject = escape(subject_name);
    if stats.total == 0 {
        return format!("По предмету <b>{}</b> посещаемость пока не отмечалась.", subject);
    }
    format!(
        "📊 Посещаемость по предмету <b>{}</b>:\n\n📈 <b>Статистика:</b>\n• Всего занятий: <b>{}</b>\n• Посещено: <b>{}</b> ({:.0}%)\n• Пропущено: <b>{}</b>",
        subject,
        stats.total,
        stats.present,
        stats.present_percent(),
        stats.absent
    )
}

pub fn grade_notification_text(subject_name: &str, value: i64) -> String {
    format!(
        "📚 <b>Новая оценка!</b>\n\nПредмет: <b>{}</b>\nОценка: <b>{}</b>",
        escape(subject_name),
        value
    )
}

pub fn attendance_notification_text(entry: &ScheduleEntry, present: bool) -> String {
    let status = if present { "✅ Был" } else { "❌ Не был" };
    format!(
        "📋 <b>Отметка посещаемости</b>\n\nПредмет: <b>{}</b>\nЗанятие: {}\nСтатус: {}",
        escape(&entry.subject_name),
        escape(&lesson_label(entry)),
        status
    )
}

fn import_success_text(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Students => "✅ Студенты успешно загружены!",
        RecordKind::Teachers => "✅ Преподаватели успешно загружены!",
        RecordKind::Schedule => "✅ Расписание успешно загружено!",
    }
}

fn kind_title(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Students => "студентов",
        RecordKind::Teachers => "преподавателей",
        RecordKind::Schedule => "расписания",
    }
}

fn structural_text(kind: RecordKind, error: &StructuralError) -> String {
    match error {
        StructuralError::EmptyFile => "Файл пустой. Отправьте файл с данными.".to_string(),
        StructuralError::HeaderOnly => "Файл содержит только заголовки. Добавьте данные.".to_string(),
        StructuralError::HeaderMismatch { expected, actual, .. } => format!(
            "Неверная структура файла {}.\n\nОжидаются столбцы:\n<code>{}</code>\n\nПолучены:\n<code>{}</code>",
            kind_title(kind),
            escape(&expected.join(", ")),
            escape(&actual.join(", "))
        ),
        StructuralError::MalformedFile { .. } => {
            "Ошибка чтения CSV файла. Убедитесь что файл имеет правильный формат.".to_string()
        }
        StructuralError::Io(_) => "Не удалось прочитать файл. Попробуйте отправить его ещё раз.".to_string(),
    }
}

/// Line number in the file as a spreadsheet shows it (header is line 1)
fn file_line(row_index: usize) -> usize {
    row_index + 2
}

fn import_error_text(error: &ImportError) -> String {
    match error {
        ImportError::RoleResolutionFailed { role } => {
            format!("В базе не найдена роль «{}». Обратитесь к разработчику.", role)
        }
        ImportError::RowParseError { row_index, cause } => {
            format!("Строка {}: {}", file_line(*row_index), escape(cause))
        }
        ImportError::ForeignKeyResolutionFailed { row_index, field } => format!(
            "Строка {}: не заполнено поле <code>{}</code>",
            file_line(*row_index),
            field
        ),
        ImportError::StorageError { .. } => "Не удалось сохранить данные. Попробуйте позже.".to_string(),
    }
}

fn error_text(body: &str) -> String {
    format!("❌ Ошибка:\n\n{}", body)
}

/// Chat message for the terminal outcome of an upload
pub fn outcome_text(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Imported(summary) => format!(
            "{}\nЗагружено строк: <b>{}</b>",
            import_success_text(summary.kind),
            summary.rows
        ),
        UploadOutcome::InvalidFile { kind, error } => error_text(&structural_text(*kind, error)),
        UploadOutcome::ImportFailed { error, .. } => {
            error_text(&format!("{}\n\nФайл не загружен, исправьте его и отправьте снова.", import_error_text(error)))
        }
        UploadOutcome::FetchFailed { .. } => error_text("Не удалось получить файл. Попробуйте снова."),
        UploadOutcome::MultipleFiles { count } => format!(
            "Отправлено {} файла(ов). Пожалуйста, отправьте только один CSV файл за раз.",
            count
        ),
        UploadOutcome::NoFileAttached => "Файл не найден. Отправьте CSV файл.".to_string(),
        UploadOutcome::NotExpected => UNKNOWN_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use unicore::import::ImportSummary;

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            id: 1,
            subject_id: 1,
            subject_name: "Math <adv>".into(),
            lesson_type: "Лекция".into(),
            classroom: "101".into(),
            group_id: 1,
            group_name: "IU7-11".into(),
            teacher_id: 1,
            teacher_name: "Petr Ivanov".into(),
            weekday: 1,
            start_time: "09:00".into(),
            end_time: "10:30".into(),
        }
    }

    #[test]
    fn test_day_wrap() {
        assert_eq!(prev_day(1), 7);
        assert_eq!(next_day(7), 1);
        assert_eq!(next_day(3), 4);
        assert_eq!(weekday_name(3), "Среда");
        assert_eq!(weekday_name(9), "?");
    }

    #[test]
    fn test_schedule_text_escapes_names() {
        let text = schedule_text(1, &[entry()]);
        assert!(text.starts_with("📅 <b>Понедельник</b>"));
        assert!(text.contains("Math &lt;adv&gt;"));
        assert!(text.contains("09:00–10:30"));
        assert_eq!(schedule_text(6, &[]), "📅 <b>Суббота</b>\n\nНет занятий.");
    }

    #[test]
    fn test_lesson_label() {
        assert_eq!(lesson_label(&entry()), "Пн 09:00 Лекция");
    }

    #[test]
    fn test_grades_text_has_average() {
        let at = NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let grade = |value| GradeRecord {
            value,
            lesson_type: "Семинар".into(),
            weekday: 2,
            start_time: "09:00".into(),
            created_at: at,
        };
        let text = grades_text("Math", &[grade(5), grade(4)]);
        assert!(text.contains("Всего оценок: <b>2</b>"));
        assert!(text.contains("Средний балл: <b>4.50</b>"));
        assert_eq!(grades_text("Math", &[]), "По предмету <b>Math</b> оценок пока нет.");
    }

    #[test]
    fn test_attendance_text_percent() {
        let stats = AttendanceStats {
            total: 4,
            present: 3,
            absent: 1,
        };
        let text = attendance_text("Math", &stats);
        assert!(text.contains("Посещено: <b>3</b> (75%)"));
        assert!(text.contains("Пропущено: <b>1</b>"));
    }

    #[test]
    fn test_outcome_texts() {
        let ok = outcome_text(&UploadOutcome::Imported(ImportSummary {
            kind: RecordKind::Teachers,
            rows: 2,
        }));
        assert!(ok.starts_with("✅ Преподаватели успешно загружены!"));

        let mismatch = outcome_text(&UploadOutcome::InvalidFile {
            kind: RecordKind::Teachers,
            error: StructuralError::HeaderMismatch {
                kind: RecordKind::Teachers,
                expected: vec!["User_id".into(), "Last_name".into(), "First_name".into()],
                actual: vec!["id".into()],
            },
        });
        assert!(mismatch.contains("<code>User_id, Last_name, First_name</code>"));
        assert!(mismatch.contains("<code>id</code>"));

        let row = outcome_text(&UploadOutcome::ImportFailed {
            kind: RecordKind::Schedule,
            error: ImportError::ForeignKeyResolutionFailed {
                row_index: 0,
                field: "group_name",
            },
        });
        assert!(row.contains("Строка 2"));

        assert_eq!(
            outcome_text(&UploadOutcome::MultipleFiles { count: 3 }),
            "Отправлено 3 файла(ов). Пожалуйста, отправьте только один CSV файл за раз."
        );
    }
}
