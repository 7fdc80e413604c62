use payslip_redactor_core::contract::{RedactionRequest, UploadedFile};
use payslip_redactor_core::validate::{safe_file_name, validate, ValidationError};

struct TestCase {
    name: &'static str,
    request: RedactionRequest,
    expected: Result<(&'static str, Vec<&'static str>), ValidationError>,
}

fn file(name: &str) -> UploadedFile {
    UploadedFile::new(name, b"content".to_vec())
}

#[test]
fn test_validate_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "missing spreadsheet",
            request: RedactionRequest {
                spreadsheet: None,
                pdfs: vec![file("a.pdf")],
            },
            expected: Err(ValidationError::MissingSpreadsheet),
        },
        TestCase {
            name: "spreadsheet with empty filename",
            request: RedactionRequest {
                spreadsheet: Some(file("")),
                pdfs: vec![],
            },
            expected: Err(ValidationError::MissingSpreadsheet),
        },
        TestCase {
            name: "spreadsheet name that is only a directory",
            request: RedactionRequest {
                spreadsheet: Some(file("dir/")),
                pdfs: vec![],
            },
            expected: Err(ValidationError::UnsupportedSpreadsheet),
        },
        TestCase {
            name: "spreadsheet name with trailing separator",
            request: RedactionRequest {
                spreadsheet: Some(file("dir/a.csv/")),
                pdfs: vec![file("scans\\apr.pdf\\")],
            },
            expected: Ok(("a.csv", vec!["apr.pdf"])),
        },
        TestCase {
            name: "spreadsheet with wrong extension",
            request: RedactionRequest {
                spreadsheet: Some(file("payroll.txt")),
                pdfs: vec![],
            },
            expected: Err(ValidationError::UnsupportedSpreadsheet),
        },
        TestCase {
            name: "spreadsheet checked before pdfs",
            request: RedactionRequest {
                spreadsheet: Some(file("payroll.docx")),
                pdfs: vec![file("notes.txt")],
            },
            expected: Err(ValidationError::UnsupportedSpreadsheet),
        },
        TestCase {
            name: "uppercase extensions accepted",
            request: RedactionRequest {
                spreadsheet: Some(file("Payroll.XLSX")),
                pdfs: vec![file("Jan.PDF")],
            },
            expected: Ok(("Payroll.XLSX", vec!["Jan.PDF"])),
        },
        TestCase {
            name: "csv with no pdfs",
            request: RedactionRequest {
                spreadsheet: Some(file("people.csv")),
                pdfs: vec![],
            },
            expected: Ok(("people.csv", vec![])),
        },
        TestCase {
            name: "first unsupported pdf reported with original name",
            request: RedactionRequest {
                spreadsheet: Some(file("people.xls")),
                pdfs: vec![file("ok.pdf"), file("dir/evil.exe"), file("bad.doc")],
            },
            expected: Err(ValidationError::UnsupportedFile("dir/evil.exe".into())),
        },
        TestCase {
            name: "empty pdf parts skipped",
            request: RedactionRequest {
                spreadsheet: Some(file("people.xlsx")),
                pdfs: vec![file(""), file("feb.pdf")],
            },
            expected: Ok(("people.xlsx", vec!["feb.pdf"])),
        },
        TestCase {
            name: "directory parts stripped",
            request: RedactionRequest {
                spreadsheet: Some(file("../../etc/people.xlsx")),
                pdfs: vec![file("C:\\Users\\me\\mar.pdf")],
            },
            expected: Ok(("people.xlsx", vec!["mar.pdf"])),
        },
    ];

    for case in test_cases {
        let result = validate(case.request);
        match (result, case.expected) {
            (Ok(validated), Ok((spreadsheet, pdfs))) => {
                assert_eq!(validated.spreadsheet.name, spreadsheet, "case: {}", case.name);
                let names: Vec<&str> = validated.pdfs.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, pdfs, "case: {}", case.name);
            }
            (Err(actual), Err(expected)) => {
                assert_eq!(actual, expected, "case: {}", case.name);
            }
            (actual, expected) => {
                panic!("case: {}: expected {:?}, got {:?}", case.name, expected, actual.map(|v| v.spreadsheet.name));
            }
        }
    }
}

#[test]
fn test_validation_messages_are_user_facing() {
    assert_eq!(
        ValidationError::MissingSpreadsheet.to_string(),
        "Missing Excel/CSV file."
    );
    assert_eq!(
        ValidationError::UnsupportedSpreadsheet.to_string(),
        "Unsupported Excel/CSV type. Use .xlsx, .xls, or .csv."
    );
    assert_eq!(
        ValidationError::UnsupportedFile("x.png".into()).to_string(),
        "Unsupported file: x.png"
    );
}

#[test]
fn test_safe_file_name_rejects_unusable_names() {
    assert_eq!(safe_file_name("a/b/c.pdf").as_deref(), Some("c.pdf"));
    assert_eq!(safe_file_name("a\\b.pdf").as_deref(), Some("b.pdf"));
    assert_eq!(safe_file_name("plain.csv").as_deref(), Some("plain.csv"));
    assert_eq!(safe_file_name(""), None);
    assert_eq!(safe_file_name("dir/").as_deref(), Some("dir"));
    assert_eq!(safe_file_name("dir/a.csv//").as_deref(), Some("a.csv"));
    assert_eq!(safe_file_name("/"), None);
    assert_eq!(safe_file_name(".."), None);
    assert_eq!(safe_file_name("x/."), None);
}
