//! Messages the bot sends on its own: upload outcomes and notices to students

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};
use unicore::storage::schedule::ScheduleEntry;
use unicore::storage::{DbPool, User};
use unicore::upload::{OutcomeNotifier, UploadOutcome};

use crate::telegram::menu::helpers::{is_blocked, load_user};
use crate::telegram::menu::{keyboards, send_main_menu};
use crate::telegram::render;

/// Reports upload outcomes to the uploader, followed by their role menu
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    db_pool: Arc<DbPool>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, db_pool: Arc<DbPool>) -> Self {
        Self { bot, db_pool }
    }
}

#[async_trait]
impl OutcomeNotifier for TelegramNotifier {
    async fn notify(&self, user_id: i64, outcome: UploadOutcome) {
        let chat_id = ChatId(user_id);
        if let Err(e) = self
            .bot
            .send_message(chat_id, render::outcome_text(&outcome))
            .parse_mode(ParseMode::Html)
            .await
        {
            log::error!("Failed to send upload outcome to {}: {}", user_id, e);
            return;
        }

        match load_user(&self.db_pool, user_id) {
            Ok(Some(user)) => {
                if let Err(e) = send_main_menu(&self.bot, chat_id, &user, None).await {
                    log::warn!("Failed to send menu after upload to {}: {}", user_id, e);
                }
            }
            Ok(None) => log::warn!("Upload outcome for unregistered user {}", user_id),
            Err(e) => log::error!("Failed to load user {} after upload: {}", user_id, e),
        }
    }
}

async fn send_to_student(bot: &Bot, student: &User, text: String, keyboard: Option<InlineKeyboardMarkup>) {
    let Some(telegram_id) = student.external_id else {
        log::debug!("Student {} has no Telegram id, notification skipped", student.id);
        return;
    };
    let mut req = bot.send_message(ChatId(telegram_id), text).parse_mode(ParseMode::Html);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    match req.await {
        Ok(_) => {}
        Err(e) if is_blocked(&e) => log::info!("Student {} blocked the bot", telegram_id),
        Err(e) => log::warn!("Failed to notify student {}: {}", telegram_id, e),
    }
}

/// Tells a student about a new grade, with a button to their grades
pub async fn notify_student_grade(bot: &Bot, student: &User, subject_id: i64, subject_name: &str, value: i64) {
    send_to_student(
        bot,
        student,
        render::grade_notification_text(subject_name, value),
        Some(keyboards::view_grades_keyboard(subject_id)),
    )
    .await;
}

pub async fn notify_student_attendance(bot: &Bot, student: &User, lesson: &ScheduleEntry, present: bool) {
    send_to_student(
        bot,
        student,
        render::attendance_notification_text(lesson, present),
        None,
    )
    .await;
}
