use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString};
use thiserror::Error;

use crate::import::RecordKind;
use crate::storage::users::Role;

/// Separator between payload tokens
pub const DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("unrecognized callback payload: {0:?}")]
    UnrecognizedPayload(String),
}

/// Top-level menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, EnumIter)]
pub enum MenuTarget {
    #[strum(serialize = "back")]
    Main,
    #[strum(serialize = "schedule")]
    Schedule,
    #[strum(serialize = "grade")]
    GradeEntry,
    #[strum(serialize = "attend")]
    AttendanceEntry,
    #[strum(serialize = "grades")]
    MyGrades,
    #[strum(serialize = "attendance")]
    MyAttendance,
}

/// Typed form of an inline button payload
///
/// Parsing is purely syntactic; ids are not checked against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Upload(RecordKind),
    Menu(MenuTarget),
    RolePicker,
    /// Never `Role::SuperUser`
    SwitchRole(Role),
    ScheduleDay(u8),
    GradeSubject { subject_id: i64 },
    GradeGroup { subject_id: i64, group_id: i64 },
    GradePage { subject_id: i64, group_id: i64, page: usize },
    GradeStudent { subject_id: i64, group_id: i64, student_id: i64 },
    GradeLesson { schedule_id: i64, student_id: i64 },
    GradeValue { schedule_id: i64, student_id: i64, value: u8 },
    AttendSubject { subject_id: i64 },
    AttendGroup { subject_id: i64, group_id: i64 },
    AttendLesson { subject_id: i64, group_id: i64, schedule_id: i64 },
    AttendRestPresent { subject_id: i64, group_id: i64, schedule_id: i64 },
    AttendAbsent { subject_id: i64, group_id: i64, schedule_id: i64, student_id: i64 },
    MyGrades { subject_id: i64 },
    MyAttendance { subject_id: i64 },
}

impl CallbackAction {
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        parse_tokens(payload).ok_or_else(|| PayloadError::UnrecognizedPayload(payload.to_string()))
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl FromStr for CallbackAction {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parses a number only in its canonical decimal form, so re-encoding is exact
fn num<T: FromStr + ToString>(token: &str) -> Option<T> {
    token.parse::<T>().ok().filter(|n| n.to_string() == token)
}

fn in_range(token: &str, lo: u8, hi: u8) -> Option<u8> {
    num::<u8>(token).filter(|n| (lo..=hi).contains(n))
}

fn parse_tokens(payload: &str) -> Option<CallbackAction> {
    use CallbackAction::*;

    let tokens: Vec<&str> = payload.split(DELIMITER).collect();
    let action = match tokens.as_slice() {
        ["up", kind] => Upload(kind.parse().ok()?),
        ["menu", target] => Menu(target.parse().ok()?),
        ["role", "pick"] => RolePicker,
        ["role", role] => match role.parse().ok()? {
            Role::SuperUser => return None,
            role => SwitchRole(role),
        },
        ["sch", "day", day] => ScheduleDay(in_range(day, 1, 7)?),
        ["grd", "subj", s] => GradeSubject { subject_id: num(s)? },
        ["grd", "grp", s, g] => GradeGroup {
            subject_id: num(s)?,
            group_id: num(g)?,
        },
        ["grd", "page", s, g, p] => GradePage {
            subject_id: num(s)?,
            group_id: num(g)?,
            page: num(p)?,
        },
        ["grd", "stud", s, g, st] => GradeStudent {
            subject_id: num(s)?,
            group_id: num(g)?,
            student_id: num(st)?,
        },
        ["grd", "sch", sc, st] => GradeLesson {
            schedule_id: num(sc)?,
            student_id: num(st)?,
        },
        ["grd", "val", sc, st, v] => GradeValue {
            schedule_id: num(sc)?,
            student_id: num(st)?,
            value: in_range(v, 0, 5)?,
        },
        ["att", "subj", s] => AttendSubject { subject_id: num(s)? },
        ["att", "grp", s, g] => AttendGroup {
            subject_id: num(s)?,
            group_id: num(g)?,
        },
        ["att", "sch", s, g, sc] => AttendLesson {
            subject_id: num(s)?,
            group_id: num(g)?,
            schedule_id: num(sc)?,
        },
        ["att", "all", s, g, sc] => AttendRestPresent {
            subject_id: num(s)?,
            group_id: num(g)?,
            schedule_id: num(sc)?,
        },
        ["att", "abs", s, g, sc, st] => AttendAbsent {
            subject_id: num(s)?,
            group_id: num(g)?,
            schedule_id: num(sc)?,
            student_id: num(st)?,
        },
        ["my", "grades", s] => MyGrades { subject_id: num(s)? },
        ["my", "attend", s] => MyAttendance { subject_id: num(s)? },
        _ => return None,
    };
    Some(action)
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CallbackAction::*;

        match self {
            Upload(kind) => write!(f, "up:{}", kind.as_ref()),
            Menu(target) => write!(f, "menu:{}", target.as_ref()),
            RolePicker => f.write_str("role:pick"),
            SwitchRole(role) => write!(f, "role:{}", role.as_ref()),
            ScheduleDay(day) => write!(f, "sch:day:{}", day),
            GradeSubject { subject_id } => write!(f, "grd:subj:{}", subject_id),
            GradeGroup { subject_id, group_id } => write!(f, "grd:grp:{}:{}", subject_id, group_id),
            GradePage {
                subject_id,
                group_id,
                page,
            } => write!(f, "grd:page:{}:{}:{}", subject_id, group_id, page),
            GradeStudent {
                subject_id,
                group_id,
                student_id,
            } => write!(f, "grd:stud:{}:{}:{}", subject_id, group_id, student_id),
            GradeLesson { schedule_id, student_id } => write!(f, "grd:sch:{}:{}", schedule_id, student_id),
            GradeValue {
                schedule_id,
                student_id,
                value,
            } => write!(f, "grd:val:{}:{}:{}", schedule_id, student_id, value),
            AttendSubject { subject_id } => write!(f, "att:subj:{}", subject_id),
            AttendGroup { subject_id, group_id } => write!(f, "att:grp:{}:{}", subject_id, group_id),
            AttendLesson {
                subject_id,
                group_id,
                schedule_id,
            } => write!(f, "att:sch:{}:{}:{}", subject_id, group_id, schedule_id),
            AttendRestPresent {
                subject_id,
                group_id,
                schedule_id,
            } => write!(f, "att:all:{}:{}:{}", subject_id, group_id, schedule_id),
            AttendAbsent {
                subject_id,
                group_id,
                schedule_id,
                student_id,
            } => write!(f, "att:abs:{}:{}:{}:{}", subject_id, group_id, schedule_id, student_id),
            MyGrades { subject_id } => write!(f, "my:grades:{}", subject_id),
            MyAttendance { subject_id } => write!(f, "my:attend:{}", subject_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_known_payloads() {
        assert_eq!(
            CallbackAction::parse("up:schedule").unwrap(),
            CallbackAction::Upload(RecordKind::Schedule)
        );
        assert_eq!(
            CallbackAction::parse("menu:attend").unwrap(),
            CallbackAction::Menu(MenuTarget::AttendanceEntry)
        );
        assert_eq!(
            CallbackAction::parse("role:teacher").unwrap(),
            CallbackAction::SwitchRole(Role::Teacher)
        );
        assert_eq!(
            CallbackAction::parse("att:abs:3:4:15:92").unwrap(),
            CallbackAction::AttendAbsent {
                subject_id: 3,
                group_id: 4,
                schedule_id: 15,
                student_id: 92
            }
        );
        assert_eq!(
            CallbackAction::parse("grd:page:1:2:0").unwrap(),
            CallbackAction::GradePage {
                subject_id: 1,
                group_id: 2,
                page: 0
            }
        );
    }

    #[test]
    fn test_payloads_encode_back_exactly() {
        let payloads = [
            "up:students",
            "menu:back",
            "menu:grades",
            "role:pick",
            "role:student",
            "sch:day:7",
            "grd:subj:12",
            "grd:grp:12:3",
            "grd:stud:12:3:40",
            "grd:sch:8:40",
            "grd:val:8:40:0",
            "att:subj:1",
            "att:grp:1:2",
            "att:sch:1:2:3",
            "att:all:1:2:3",
            "my:grades:5",
            "my:attend:5",
        ];
        for payload in payloads {
            assert_eq!(CallbackAction::parse(payload).unwrap().encode(), payload);
        }
    }

    #[test]
    fn test_malformed_payloads_fail_closed() {
        let bad = [
            "",
            "up",
            "up:grades",
            "menu",
            "role:super_user",
            "sch:day:0",
            "sch:day:8",
            "sch:day:x",
            "grd:subj",
            "grd:subj:1:2",
            "grd:grp:1",
            "grd:val:1:2:6",
            "grd:val:1:2:-1",
            "att:abs:1:2:3",
            "att:sch:a:b:c",
            "grd:subj:+5",
            "grd:subj:05",
            "my:grades:",
            "unknown:1",
        ];
        for payload in bad {
            assert_eq!(
                CallbackAction::parse(payload),
                Err(PayloadError::UnrecognizedPayload(payload.to_string())),
                "{payload:?} should be rejected"
            );
        }
    }
}
