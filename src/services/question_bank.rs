use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use thiserror::Error;

use crate::db::types::QuizType;

pub(crate) const REQUIRED_COLUMNS: [&str; 7] =
    ["quiz_type", "question", "option1", "option2", "option3", "option4", "answer"];

/// Raw question fields as typed by an admin or read from a spreadsheet row.
#[derive(Debug, Default, Clone)]
pub(crate) struct QuestionDraft {
    pub(crate) quiz_type: String,
    pub(crate) question: String,
    pub(crate) options: [String; 4],
    pub(crate) answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidQuestion {
    pub(crate) quiz_type: QuizType,
    pub(crate) question: String,
    pub(crate) options: [String; 4],
    pub(crate) answer: String,
}

impl ValidQuestion {
    pub(crate) fn option_refs(&self) -> [&str; 4] {
        [&self.options[0], &self.options[1], &self.options[2], &self.options[3]]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DraftError {
    #[error("All fields are required!")]
    MissingFields,
    #[error("Invalid quiz type! Must be \"Tech\" or \"Software\".")]
    InvalidQuizType(String),
    #[error("Answer must match one of the options!")]
    AnswerNotAnOption,
}

impl DraftError {
    /// Wording used in the per-row report of a spreadsheet upload.
    pub(crate) fn row_message(&self, row: usize) -> String {
        match self {
            Self::MissingFields => format!("Row {row}: Missing required fields."),
            Self::InvalidQuizType(value) => {
                format!("Row {row}: Invalid quiz_type '{value}'. Must be 'Tech' or 'Software'.")
            }
            Self::AnswerNotAnOption => {
                format!("Row {row}: Answer must match one of the options.")
            }
        }
    }
}

impl QuestionDraft {
    pub(crate) fn validate(&self) -> Result<ValidQuestion, DraftError> {
        let quiz_type = self.quiz_type.trim();
        let question = self.question.trim();
        let options = self.options.clone().map(|option| option.trim().to_string());
        let answer = self.answer.trim();

        if quiz_type.is_empty()
            || question.is_empty()
            || answer.is_empty()
            || options.iter().any(String::is_empty)
        {
            return Err(DraftError::MissingFields);
        }

        let quiz_type = quiz_type
            .parse::<QuizType>()
            .map_err(|_| DraftError::InvalidQuizType(quiz_type.to_string()))?;

        if !options.iter().any(|option| option == answer) {
            return Err(DraftError::AnswerNotAnOption);
        }

        Ok(ValidQuestion {
            quiz_type,
            question: question.to_string(),
            options,
            answer: answer.to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("Error reading Excel file: {0}")]
    Unreadable(String),
    #[error("Missing required columns in Excel file: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Default)]
pub(crate) struct ParsedSheet {
    pub(crate) questions: Vec<ValidQuestion>,
    pub(crate) errors: Vec<String>,
}

/// Reads the first worksheet; the header row may list the columns in any order.
pub(crate) fn parse_workbook(bytes: &[u8]) -> Result<ParsedSheet, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|err: calamine::XlsxError| ImportError::Unreadable(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Unreadable("workbook has no worksheets".to_string()))?
        .map_err(|err| ImportError::Unreadable(err.to_string()))?;

    // Spreadsheet numbering is 1-based and the range may not start at A1.
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();

    let header: Vec<String> =
        rows.next().map(|cells| cells.iter().map(cell_text).collect()).unwrap_or_default();
    let positions: Vec<Option<usize>> = REQUIRED_COLUMNS
        .iter()
        .map(|column| header.iter().position(|name| name == column))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip(&positions)
        .filter(|(_, position)| position.is_none())
        .map(|(column, _)| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let mut parsed = ParsedSheet::default();
    for (offset, cells) in rows.enumerate() {
        let row_number = first_row + offset + 1;
        let value = |index: usize| {
            positions[index]
                .and_then(|position| cells.get(position))
                .map(cell_text)
                .unwrap_or_default()
        };
        let draft = QuestionDraft {
            quiz_type: value(0),
            question: value(1),
            options: [value(2), value(3), value(4), value(5)],
            answer: value(6),
        };

        if is_blank(&draft) {
            continue;
        }

        match draft.validate() {
            Ok(question) => parsed.questions.push(question),
            Err(err) => parsed.errors.push(err.row_message(row_number)),
        }
    }

    Ok(parsed)
}

fn is_blank(draft: &QuestionDraft) -> bool {
    draft.quiz_type.is_empty()
        && draft.question.is_empty()
        && draft.answer.is_empty()
        && draft.options.iter().all(String::is_empty)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        // Numeric options such as "42" come back as floats.
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string().trim().to_string(),
    }
}
