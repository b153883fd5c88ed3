use thiserror::Error;

/// Errors surfaced to the presenter. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlexError {
    /// No worked-time text was found anywhere in the snapshot.
    #[error("근무 시간 데이터를 찾을 수 없습니다. 페이지를 새로고침해주세요.")]
    NoDataFound,

    /// The parsed triple failed validation; carries the ordered error list.
    #[error("{}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    /// The hard timeout elapsed without a presentable result.
    #[error("근무 시간 정보를 불러오지 못했습니다. 페이지를 새로고침해주세요.")]
    AcquisitionTimedOut,

    /// Building or handing over the result failed.
    #[error("화면 표시 중 오류가 발생했습니다.")]
    PresentationFailure { detail: String },
}

impl FlexError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FlexError::PresentationFailure { .. })
    }
}

/// A clock string that is neither `HH:MM` nor `익일 HH:MM`, or is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockParseError {
    #[error("clock text '{0}' is not HH:MM or 익일 HH:MM")]
    Shape(String),

    #[error("clock value {hour:02}:{minute:02} is out of range")]
    OutOfRange { hour: u32, minute: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("fragment {index} names parent {parent}, which does not precede it")]
    ParentOutOfOrder { index: usize, parent: usize },
}
