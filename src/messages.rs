//! Localised user-facing text.
//!
//! Every sentence a user can see for a failed or finished operation lives
//! here, in both supported languages.

use crate::settings::Language;

/// Fixed user-facing sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoDocumentLoaded,
    NoPagesSelected,
    CannotDeleteAllPages,
    NoRotationSet,
    NoAnnotations,
    NotAPdf,
    UnsupportedFileType,
    UnsupportedOperation,
    FileUnreadable,
    Encrypted,
    ProcessingFailed,
    OcrFailed,
    EnvironmentUnavailable,
    GenericFailure,
    LossyConversion,
}

impl Message {
    pub fn text(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Message::NoDocumentLoaded, Language::Korean) => "먼저 PDF 파일을 선택해주세요.",
            (Message::NoDocumentLoaded, Language::English) => "Please choose a PDF file first.",

            (Message::NoPagesSelected, Language::Korean) => "처리할 페이지를 선택해주세요.",
            (Message::NoPagesSelected, Language::English) => "Please select at least one page.",

            (Message::CannotDeleteAllPages, Language::Korean) => {
                "모든 페이지를 삭제할 수는 없습니다."
            }
            (Message::CannotDeleteAllPages, Language::English) => "You cannot delete every page.",

            (Message::NoRotationSet, Language::Korean) => "회전할 페이지를 선택해주세요.",
            (Message::NoRotationSet, Language::English) => "Rotate at least one page first.",

            (Message::NoAnnotations, Language::Korean) => "추가된 주석이 없습니다.",
            (Message::NoAnnotations, Language::English) => "There are no annotations to apply.",

            (Message::NotAPdf, Language::Korean) => "유효한 PDF 파일이 아닙니다.",
            (Message::NotAPdf, Language::English) => "This is not a valid PDF file.",

            (Message::UnsupportedFileType, Language::Korean) => "지원하지 않는 파일 형식입니다.",
            (Message::UnsupportedFileType, Language::English) => "This file type is not supported.",

            (Message::UnsupportedOperation, Language::Korean) => {
                "지원하지 않는 작업입니다. (.ppt/.doc/.xls 대신 .pptx/.docx/.xlsx 파일을 사용해주세요.)"
            }
            (Message::UnsupportedOperation, Language::English) => {
                "This operation is not supported. (Use .pptx/.docx/.xlsx instead of .ppt/.doc/.xls.)"
            }

            (Message::FileUnreadable, Language::Korean) => "파일을 읽을 수 없습니다.",
            (Message::FileUnreadable, Language::English) => "The file could not be read.",

            (Message::Encrypted, Language::Korean) => "암호화된 PDF는 편집할 수 없습니다.",
            (Message::Encrypted, Language::English) => "Encrypted PDFs cannot be edited.",

            (Message::ProcessingFailed, Language::Korean) => "파일 처리 중 오류가 발생했습니다.",
            (Message::ProcessingFailed, Language::English) => {
                "An error occurred while processing the file."
            }

            (Message::OcrFailed, Language::Korean) => "텍스트 인식(OCR)에 실패했습니다.",
            (Message::OcrFailed, Language::English) => "Text recognition (OCR) failed.",

            (Message::EnvironmentUnavailable, Language::Korean) => {
                "이 환경에서는 해당 기능을 사용할 수 없습니다."
            }
            (Message::EnvironmentUnavailable, Language::English) => {
                "This feature is not available in the current environment."
            }

            (Message::GenericFailure, Language::Korean) => "작업에 실패했습니다.",
            (Message::GenericFailure, Language::English) => "The operation failed.",


            (Message::LossyConversion, Language::Korean) => {
                "간이 변환: 표/레이아웃은 포함되지 않을 수 있습니다."
            }
            (Message::LossyConversion, Language::English) => {
                "Basic conversion: tables and layout may not be preserved."
            }
        }
    }
}

pub fn page_out_of_range(lang: Language, page: usize, total: usize) -> String {
    match lang {
        Language::Korean => format!("{page}페이지는 범위를 벗어났습니다. (전체 {total}페이지)"),
        Language::English => format!("Page {page} is out of range (the document has {total} pages)."),
    }
}

pub fn not_enough_files(lang: Language, needed: usize) -> String {
    match lang {
        Language::Korean => format!("파일을 {needed}개 이상 선택해주세요."),
        Language::English => format!("Please select at least {needed} files."),
    }
}

pub fn saved_to(lang: Language, path: &str) -> String {
    match lang {
        Language::Korean => format!("저장됨: {path}"),
        Language::English => format!("Saved: {path}"),
    }
}
