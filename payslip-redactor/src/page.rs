//! Static upload form served at `/`.

pub const INDEX_HTML: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>Payslip Redactor</title>
<style>
 body{font:16px system-ui;margin:24px;max-width:720px}
 .card{padding:16px;border:1px solid #ddd;border-radius:12px}
 label{font-weight:600;display:block;margin-top:12px}
 input[type=file]{margin:6px 0}
 button{margin-top:16px;padding:10px 14px;border:0;border-radius:10px;background:#2563eb;color:#fff;font-weight:700;cursor:pointer}
 .tip{color:#666}
</style></head>
<body>
  <h1>Payslip Redactor</h1>
  <p class="tip">Upload one Excel/CSV file and any number of PDF payslips. The result is a ZIP with the redacted PDFs and a results spreadsheet.</p>
  <form class="card" action="/process" method="POST" enctype="multipart/form-data">
    <label for="excel">Excel/CSV</label>
    <input id="excel" name="excel" type="file" accept=".xlsx,.xls,.csv" required>
    <label for="pdfs">Payslip PDFs</label>
    <input id="pdfs" name="pdfs" type="file" accept=".pdf" multiple>
    <button type="submit">Run redactor</button>
  </form>
</body></html>
"#;
