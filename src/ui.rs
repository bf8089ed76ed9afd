use crate::dashboard::{DashboardView, LoadStatus, PendingDelete};
use crate::form::{RecordEntryForm, RowDraft};
use crate::login::LoginPanel;
use crate::models::{Session, VolunteerGroup};
use std::fmt::Write;

pub fn render_login(panel: &LoginPanel) -> String {
    let error = panel
        .error
        .as_deref()
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();
    let disabled = if panel.pending { " disabled" } else { "" };

    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{CHAPTER}}", &escape_html(&panel.chapter))
        .replace("{{ERROR}}", &error)
        .replace("{{DISABLED}}", disabled)
}

pub fn render_dashboard(session: &Session, view: &DashboardView, form: &RecordEntryForm) -> String {
    let notice = view
        .notice
        .as_deref()
        .map(|message| format!(r#"<p class="notice">{}</p>"#, escape_html(message)))
        .unwrap_or_default();
    let loading = if view.is_loading() {
        r#"<div class="loading">載入中…</div>"#
    } else {
        ""
    };
    let refresh_disabled = if view.is_loading() { " disabled" } else { "" };

    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{CHAPTER}}", &escape_html(&session.chapter_id))
        .replace("{{NOTICE}}", &notice)
        .replace("{{CONFIRM}}", &render_confirm(view.pending_delete.as_ref()))
        .replace("{{LOADING}}", loading)
        .replace("{{REFRESH_DISABLED}}", refresh_disabled)
        .replace("{{BODY}}", &render_table_body(view))
        .replace("{{MODAL}}", &render_modal(form))
}

fn render_table_body(view: &DashboardView) -> String {
    match &view.status {
        LoadStatus::Failed(message) => {
            return format!(
                r#"<tr><td colspan="3" class="error">{}</td></tr>"#,
                escape_html(message)
            );
        }
        LoadStatus::Loaded if view.groups.is_empty() => {
            return r#"<tr><td colspan="3" class="muted">尚無紀錄</td></tr>"#.to_string();
        }
        _ => {}
    }

    let mut html = String::new();
    for group in &view.groups {
        let expanded = view.is_expanded(&group.key());
        let _ = write!(
            html,
            r#"<tr class="expandable-row" data-id="{id}">
  <td>
    <form method="post" action="/groups/toggle">
      {hidden}
      <button class="link" type="submit" aria-expanded="{expanded}"><strong>{name}</strong></button>
    </form>
  </td>
  <td>{chapter}</td>
  <td><span class="hours-badge">{total} 小時</span></td>
</tr>
"#,
            id = escape_html(&group.representative_id),
            hidden = group_fields(group),
            name = escape_html(&group.name),
            chapter = escape_html(&group.chapter),
            total = format_hours(group.total_hours),
        );
        if expanded {
            html.push_str(&render_details(group));
        }
    }
    html
}

fn render_details(group: &VolunteerGroup) -> String {
    let mut items = String::new();
    for record in &group.records {
        let remarks = record
            .remarks
            .as_deref()
            .filter(|remarks| !remarks.is_empty())
            .map(|remarks| {
                format!(
                    r#"<span><span class="record-label">備註:</span>{}</span>"#,
                    escape_html(remarks)
                )
            })
            .unwrap_or_default();
        let _ = write!(
            items,
            r#"<div class="record-item">
  <div class="record-info">
    <span><span class="record-label">單位:</span>{unit}</span>
    <span><span class="record-label">登記人:</span>{registrar}</span>
    <span><span class="record-label">時數:</span>{hours} 小時</span>
    {remarks}
  </div>
  <form method="post" action="/records/delete">
    {hidden}
    <input type="hidden" name="record_id" value="{id}" />
    <button class="btn btn-danger" type="submit">刪除</button>
  </form>
</div>
"#,
            unit = escape_html(&record.unit),
            registrar = escape_html(&record.registrar),
            hours = format_hours(record.hours),
            hidden = group_fields(group),
            id = escape_html(&record.id),
        );
    }

    format!(
        r#"<tr class="detail-row"><td colspan="3"><div class="records-container"><h4>服務紀錄</h4><div class="records-list">{items}</div></div></td></tr>
"#
    )
}

fn render_confirm(pending: Option<&PendingDelete>) -> String {
    let Some(pending) = pending else {
        return String::new();
    };
    let disabled = if pending.in_flight { " disabled" } else { "" };
    format!(
        r#"<div class="confirm">
  <p>確定要刪除 {name}（{chapter}）的紀錄「{unit}，{hours} 小時」嗎？</p>
  <form method="post" action="/records/delete/confirm"><button class="btn btn-danger" type="submit"{disabled}>確認刪除</button></form>
  <form method="post" action="/records/delete/cancel"><button class="btn" type="submit"{disabled}>取消</button></form>
</div>"#,
        name = escape_html(&pending.group.name),
        chapter = escape_html(&pending.group.chapter),
        unit = escape_html(&pending.unit),
        hours = format_hours(pending.hours),
    )
}

fn render_modal(form: &RecordEntryForm) -> String {
    if !form.open {
        return String::new();
    }

    let rows: String = form
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| render_form_row(index, row))
        .collect();
    let error = form
        .error
        .as_deref()
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();
    let (disabled, submit_label) = if form.submitting {
        (" disabled", "送出中…")
    } else {
        ("", "送出")
    };

    format!(
        r#"<div class="modal">
  <div class="modal-card">
    <div class="modal-header">
      <h3>新增服務紀錄</h3>
      <form method="post" action="/records/form/close"><button class="btn" type="submit">關閉</button></form>
    </div>
    <form method="post" action="/records/form">
      <label>登記人 <input name="creator" value="{creator}" required /></label>
      <div class="volunteer-rows">{rows}</div>
      {error}
      <div class="modal-actions">
        <button class="btn" type="submit" name="action" value="add_row"{disabled}>新增一列</button>
        <button class="btn btn-primary" type="submit" name="action" value="submit"{disabled}>{submit_label}</button>
      </div>
    </form>
  </div>
</div>"#,
        creator = escape_html(&form.creator),
    )
}

fn render_form_row(index: usize, row: &RowDraft) -> String {
    let remove = if RecordEntryForm::is_removable(index) {
        format!(
            r#"<button class="btn btn-remove-row" type="submit" name="action" value="remove_row_{index}">移除</button>"#
        )
    } else {
        String::new()
    };
    format!(
        r#"<div class="volunteer-row-item">
  <input name="volunteer_name_{index}" placeholder="義工姓名" value="{name}" required />
  <input name="chapter_{index}" placeholder="分院" value="{chapter}" required />
  <input name="unit_{index}" placeholder="服務單位" value="{unit}" />
  <input name="hours_{index}" placeholder="時數" value="{hours}" inputmode="decimal" required />
  <input name="remarks_{index}" placeholder="備註" value="{remarks}" />
  {remove}
</div>"#,
        name = escape_html(&row.volunteer_name),
        chapter = escape_html(&row.chapter),
        unit = escape_html(&row.unit),
        hours = escape_html(&row.hours),
        remarks = escape_html(&row.remarks),
    )
}

fn group_fields(group: &VolunteerGroup) -> String {
    format!(
        r#"<input type="hidden" name="name" value="{}" /><input type="hidden" name="chapter" value="{}" />"#,
        escape_html(&group.name),
        escape_html(&group.chapter)
    )
}

/// Whole numbers print without a fraction, the rest as given.
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 && hours.abs() < 1e15 {
        format!("{}", hours as i64)
    } else {
        hours.to_string()
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            // keeps user text from ever forming a `{{..}}` placeholder
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>義工時數管理 - 登入</title>
  <style>{{STYLE}}</style>
</head>
<body class="login-screen">
  <main class="card login-card">
    <h1>義工時數管理</h1>
    <p class="subtitle">請以分院帳號登入</p>
    <form method="post" action="/login">
      <label>分院代號 <input name="chapter" value="{{CHAPTER}}" required autofocus /></label>
      <label>密碼 <input name="password" type="password" required /></label>
      {{ERROR}}
      <button class="btn btn-primary" type="submit"{{DISABLED}}>登入</button>
    </form>
  </main>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>義工時數管理</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="card dashboard">
    <header>
      <div>
        <h1>義工時數管理</h1>
        <p class="subtitle">分院：{{CHAPTER}}</p>
      </div>
      <div class="toolbar">
        <form method="post" action="/records/form/open"><button class="btn btn-primary" type="submit">新增紀錄</button></form>
        <form method="post" action="/refresh"><button class="btn" type="submit"{{REFRESH_DISABLED}}>重新整理</button></form>
        <form method="post" action="/logout"><button class="btn" type="submit">登出</button></form>
      </div>
    </header>
    {{NOTICE}}
    {{CONFIRM}}
    {{LOADING}}
    <table>
      <thead><tr><th>姓名</th><th>分院</th><th>總時數</th></tr></thead>
      <tbody id="volunteer-list">
{{BODY}}
      </tbody>
    </table>
  </main>
  {{MODAL}}
</body>
</html>
"#;

const STYLE: &str = r#"
    :root {
      --bg-1: #f6f1e7;
      --ink: #2b2a28;
      --accent: #a0522d;
      --accent-2: #2f4858;
      --danger: #b3261e;
      --card: rgba(255, 255, 255, 0.92);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #efe3cf);
      color: var(--ink);
      font-family: "Noto Sans TC", "PingFang TC", sans-serif;
      padding: 32px 18px 48px;
    }

    .login-screen {
      display: flex;
      align-items: center;
      justify-content: center;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 28px;
      margin: 0 auto;
    }

    .login-card {
      width: min(380px, 100%);
      display: grid;
      gap: 12px;
    }

    .dashboard {
      width: min(960px, 100%);
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      margin: 0;
    }

    .subtitle,
    .muted {
      color: #6b645d;
    }

    .toolbar,
    .modal-actions,
    .modal-header {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    .modal-header {
      justify-content: space-between;
    }

    label {
      display: grid;
      gap: 4px;
      margin-bottom: 10px;
    }

    input {
      padding: 8px 10px;
      border: 1px solid #cfc6b8;
      border-radius: 8px;
      font-size: 1rem;
    }

    .btn {
      border: 1px solid #cfc6b8;
      background: white;
      border-radius: 999px;
      padding: 8px 16px;
      cursor: pointer;
      font-size: 0.95rem;
    }

    .btn[disabled] {
      opacity: 0.5;
      cursor: progress;
    }

    .btn-primary {
      background: var(--accent-2);
      border-color: var(--accent-2);
      color: white;
    }

    .btn-danger {
      background: var(--danger);
      border-color: var(--danger);
      color: white;
    }

    button.link {
      background: none;
      border: none;
      padding: 0;
      cursor: pointer;
      font-size: 1rem;
      color: var(--accent-2);
    }

    table {
      width: 100%;
      border-collapse: collapse;
      margin-top: 20px;
    }

    th,
    td {
      text-align: left;
      padding: 10px 8px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.1);
    }

    .hours-badge {
      background: rgba(160, 82, 45, 0.12);
      color: var(--accent);
      border-radius: 999px;
      padding: 2px 10px;
      font-weight: 600;
    }

    .record-item {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 8px 0;
      border-bottom: 1px dashed #e0d7c8;
    }

    .record-info {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
    }

    .record-label {
      color: #8b857d;
      margin-right: 4px;
    }

    .error {
      color: var(--danger);
    }

    .notice,
    .confirm,
    .loading {
      margin-top: 16px;
      padding: 12px 16px;
      border-radius: 12px;
      background: rgba(47, 72, 88, 0.08);
    }

    .confirm {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      align-items: center;
      background: rgba(179, 38, 30, 0.08);
    }

    .modal {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.35);
      display: flex;
      align-items: center;
      justify-content: center;
      padding: 16px;
    }

    .modal-card {
      background: white;
      border-radius: 16px;
      padding: 24px;
      width: min(900px, 100%);
      max-height: 90vh;
      overflow: auto;
    }

    .volunteer-row-item {
      display: grid;
      grid-template-columns: repeat(5, minmax(0, 1fr)) auto;
      gap: 8px;
      margin-bottom: 8px;
    }
"#;
