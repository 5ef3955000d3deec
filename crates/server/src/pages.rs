//! HTML pages of the web UI.
//!
//! Pages are plain server-rendered documents; every value that came from a
//! user or an uploaded deck goes through [`escape_html`].

use chrono::{DateTime, NaiveDateTime};
use croco_store::{UserSummary, WordOrder, WordRow};

use crate::config::{DEFAULT_WORD_COUNT, MAX_WORDS_PAGE_SIZE, MAX_WORD_COUNT};
use crate::upload::UploadReport;

/// Shown in place of a timestamp for words the viewer never received.
const NEVER_USED: &str = "ещё не использовалось";

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; max-width: 720px; margin: 40px auto; }";

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Human-readable form of a stored usage timestamp.
///
/// Offset-less timestamps are shown as stored; anything unparseable reads as
/// never used.
pub fn format_last_used(last_used_at: Option<&str>) -> String {
    let Some(raw) = last_used_at else {
        return NEVER_USED.to_string();
    };
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|time| time.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"));
    match parsed {
        Ok(time) => time.format("%Y.%m.%d %H:%M:%S").to_string(),
        Err(_) => NEVER_USED.to_string(),
    }
}

/// Outcome of a word edit, carried back to the list page as `?msg=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Updated,
    EmptyAfterCleaning,
    NoValidSuggestion,
    Duplicate,
    NotFound,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::EmptyAfterCleaning => "empty",
            Self::NoValidSuggestion => "invalid",
            Self::Duplicate => "duplicate",
            Self::NotFound => "not_found",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "updated" => Some(Self::Updated),
            "empty" => Some(Self::EmptyAfterCleaning),
            "invalid" => Some(Self::NoValidSuggestion),
            "duplicate" => Some(Self::Duplicate),
            "not_found" => Some(Self::NotFound),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Updated => "Слово обновлено",
            Self::EmptyAfterCleaning => "Слово пустое после очистки",
            Self::NoValidSuggestion => "Проверка не дала валидного слова",
            Self::Duplicate => "Такое слово уже есть в базе",
            Self::NotFound => "Слово не найдено",
        }
    }

    /// Location of the list page showing this notice.
    pub fn location(&self) -> String {
        format!("/words?msg={}", self.code())
    }
}

fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="ru">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <style>
    {style}
  </style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

fn message_block(message: Option<&str>) -> String {
    match message {
        Some(text) if !text.is_empty() => {
            format!(r#"  <p style="color:#b00">{}</p>"#, escape_html(text))
        }
        _ => String::new(),
    }
}

pub fn index_page(username: &str, is_admin: bool, total_words: i64) -> String {
    let admin_link = if is_admin {
        r#"  <p><a href="/admin">Открыть админку</a></p>"#
    } else {
        ""
    };
    let style = format!(
        "{}
    form {{ margin: 24px 0; padding: 16px; border: 1px solid #ddd; }}
    label {{ display: block; margin-bottom: 8px; }}
    input[type=\"number\"] {{ width: 120px; }}",
        BASE_STYLE
    );
    let body = format!(
        r#"  <h1>Blitz Croco Words</h1>
  <p>Вы вошли как: {username}</p>
  <p>Всего слов в базе: {total_words}</p>
  <p><a href="/logout">Выйти</a></p>
  <p><a href="/words">Список слов</a></p>
{admin_link}

  <h2>Загрузка pptx или zip</h2>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <label>Файлы: <input type="file" name="files" accept=".pptx,.zip" multiple required></label>
    <button type="submit">Загрузить</button>
  </form>

  <h2>Скачать слова</h2>
  <form action="/words.txt" method="get">
    <label>Количество слов:
      <input type="number" name="n" min="1" max="{MAX_WORD_COUNT}" value="{DEFAULT_WORD_COUNT}" required>
    </label>
    <label>
      <input type="checkbox" name="shuffle"> Перемешать слова
    </label>
    <button type="submit">Скачать words.txt</button>
  </form>

  <h2>Сбросить использование слов</h2>
  <form action="/usage/reset" method="post">
    <button type="submit">Сбросить для меня</button>
  </form>"#,
        username = escape_html(username),
    );
    document("Blitz Croco Words", &style, &body)
}

pub fn upload_page(username: &str, report: &UploadReport) -> String {
    let style = format!("{}\n    a {{ display: inline-block; margin-top: 16px; }}", BASE_STYLE);
    let body = format!(
        r#"  <h1>Результат загрузки</h1>
  <p>Вы вошли как: {username}</p>
  <ul>
    <li>Файлы: {filenames}</li>
    <li>Извлечено: {extracted}</li>
    <li>Уникальных извлечено: {unique}</li>
    <li>Проверено уникальных: {checked}</li>
    <li>Добавлено: {inserted}</li>
  </ul>
  <a href="/">Назад</a>"#,
        username = escape_html(username),
        filenames = escape_html(&report.filenames),
        extracted = report.extracted,
        unique = report.unique_extracted,
        checked = report.checked_unique,
        inserted = report.inserted,
    );
    document("Результат загрузки", &style, &body)
}

pub fn login_page(username: &str, error: Option<&str>) -> String {
    let style = "body { font-family: Arial, sans-serif; max-width: 420px; margin: 40px auto; }
    form { margin: 16px 0; padding: 16px; border: 1px solid #ddd; }
    label { display: block; margin-bottom: 8px; }";
    let body = format!(
        r#"  <h1>Вход</h1>
{error}
  <form action="/login" method="post">
    <label>Логин:
      <input name="username" value="{username}" autocomplete="username" required>
    </label>
    <label>Пароль:
      <input type="password" name="password" autocomplete="current-password" required>
    </label>
    <button type="submit">Войти</button>
  </form>"#,
        error = message_block(error),
        username = escape_html(username),
    );
    document("Вход", style, &body)
}

const TABLE_STYLE: &str = "body { font-family: Arial, sans-serif; max-width: 860px; margin: 40px auto; }
    table { border-collapse: collapse; width: 100%; margin: 16px 0; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }";

pub fn admin_page(username: &str, users: &[UserSummary]) -> String {
    let rows: String = users
        .iter()
        .map(|user| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&user.username),
                if user.is_admin { "да" } else { "нет" },
                escape_html(&user.created_at),
            )
        })
        .collect();
    let options: String = users
        .iter()
        .map(|user| format!(r#"<option value="{}"></option>"#, escape_html(&user.username)))
        .collect();

    let style = format!(
        "{}
    form {{ margin: 16px 0; padding: 12px; border: 1px solid #ddd; }}
    label {{ display: block; margin-bottom: 8px; }}",
        TABLE_STYLE
    );
    let body = format!(
        r#"  <h1>Админка</h1>
  <p>Вы вошли как: {username}</p>
  <p><a href="/">Назад</a> · <a href="/words">Список слов</a> · <a href="/logout">Выйти</a></p>

  <h2>Пользователи</h2>
  <table>
    <thead>
      <tr><th>Логин</th><th>Админ</th><th>Создан</th></tr>
    </thead>
    <tbody>
      {rows}
    </tbody>
  </table>

  <datalist id="usernames">
    {options}
  </datalist>

  <h2>Создать пользователя</h2>
  <form action="/admin/users/create" method="post">
    <label>Логин: <input name="username" list="usernames" required></label>
    <label>Пароль: <input type="password" name="password" required></label>
    <label><input type="checkbox" name="is_admin"> Админ</label>
    <button type="submit">Создать</button>
  </form>

  <h2>Сменить пароль</h2>
  <form action="/admin/users/password" method="post">
    <label>Логин: <input name="username" list="usernames" required></label>
    <label>Новый пароль: <input type="password" name="password" required></label>
    <button type="submit">Сменить пароль</button>
  </form>

  <h2>Изменить роль</h2>
  <form action="/admin/users/role" method="post">
    <label>Логин: <input name="username" list="usernames" required></label>
    <label><input type="checkbox" name="is_admin"> Админ</label>
    <button type="submit">Изменить роль</button>
  </form>

  <h2>Удалить пользователя</h2>
  <form action="/admin/users/delete" method="post">
    <label>Логин: <input name="username" list="usernames" required></label>
    <button type="submit">Удалить</button>
  </form>

  <h2>Сбросить использование</h2>
  <form action="/admin/users/reset-usage" method="post">
    <label>Логин: <input name="username" list="usernames" required></label>
    <button type="submit">Сбросить</button>
  </form>"#,
        username = escape_html(username),
    );
    document("Админка", &style, &body)
}

/// Everything the word list page shows.
pub struct WordsPage<'a> {
    pub username: &'a str,
    pub words: &'a [WordRow],
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub order: WordOrder,
    pub notice: Option<Notice>,
}

impl WordsPage<'_> {
    pub fn total_pages(&self) -> i64 {
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    fn page_link(&self, page: i64, label: &str) -> String {
        format!(
            r#"<a href="/words?page={}&amp;per_page={}&amp;order={}">{}</a>"#,
            page,
            self.per_page,
            self.order.as_str(),
            label
        )
    }

    /// Previous and next links; a disabled side is a plain span.
    fn nav_links(&self) -> (String, String) {
        let prev = if self.page > 1 {
            self.page_link(self.page - 1, "Prev")
        } else {
            "<span>Prev</span>".to_string()
        };
        let next = if self.page < self.total_pages() {
            self.page_link(self.page + 1, "Next")
        } else {
            "<span>Next</span>".to_string()
        };
        (prev, next)
    }

    pub fn render(&self) -> String {
        let rows: String = self
            .words
            .iter()
            .map(|row| {
                let word = escape_html(&row.word);
                format!(
                    concat!(
                        "<tr><td>{word}</td><td>{used}</td><td>",
                        r#"<form method="post" action="/words/edit">"#,
                        r#"<input type="hidden" name="word_id" value="{id}">"#,
                        r#"<input name="word" value="{word}" required>"#,
                        r#"<button type="submit">Сохранить</button>"#,
                        "</form></td></tr>"
                    ),
                    word = word,
                    used = escape_html(&format_last_used(row.last_used_at.as_deref())),
                    id = row.id,
                )
            })
            .collect();

        let total_pages = self.total_pages();
        let (prev, next) = self.nav_links();
        let selected = |order: WordOrder| if self.order == order { "selected" } else { "" };

        let style = format!(
            "{}
    form {{ margin: 12px 0; }}
    nav {{ display: flex; gap: 12px; align-items: center; margin: 12px 0; }}
    nav span {{ color: #666; }}",
            TABLE_STYLE
        );
        let body = format!(
            r#"  <h1>Слова</h1>
  <p>Вы вошли как: {username}</p>
  <p>Всего слов в базе: {total}</p>
  <p><a href="/">Назад</a> · <a href="/logout">Выйти</a></p>
{message}

  <form method="get" action="/words">
    <label>Сортировка:
      <select name="order">
        <option value="alpha" {alpha}>По алфавиту</option>
        <option value="created_desc" {created}>Сначала новые</option>
      </select>
    </label>
    <label>На странице:
      <input type="number" name="per_page" min="1" max="{max_per_page}" value="{per_page}" required>
    </label>
    <input type="hidden" name="page" value="1">
    <button type="submit">Применить</button>
  </form>

  <nav>
    {prev}
    <span>Страница {page} / {total_pages} · Всего {total}</span>
    {next}
  </nav>

  <table>
    <thead>
      <tr><th>Слово</th><th>Последнее использование</th><th>Правка</th></tr>
    </thead>
    <tbody>
      {rows}
    </tbody>
  </table>

  <nav>
    {prev}
    <span>Страница {page} / {total_pages}</span>
    {next}
  </nav>"#,
            username = escape_html(self.username),
            total = self.total,
            message = message_block(self.notice.map(|n| n.message())),
            alpha = selected(WordOrder::Alpha),
            created = selected(WordOrder::CreatedDesc),
            max_per_page = MAX_WORDS_PAGE_SIZE,
            per_page = self.per_page,
            page = self.page,
        );
        document("Слова", &style, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, word: &str, last_used_at: Option<&str>) -> WordRow {
        WordRow {
            id,
            word: word.to_string(),
            last_used_at: last_used_at.map(str::to_string),
        }
    }

    fn words_page<'a>(words: &'a [WordRow], total: i64, page: i64, per_page: i64) -> WordsPage<'a> {
        WordsPage {
            username: "alice",
            words,
            total,
            page,
            per_page,
            order: WordOrder::Alpha,
            notice: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape_html("кот"), "кот");
    }

    #[test]
    fn test_format_last_used() {
        assert_eq!(format_last_used(None), NEVER_USED);
        assert_eq!(
            format_last_used(Some("2024-03-05T07:08:09.123456Z")),
            "2024.03.05 07:08:09"
        );
        assert_eq!(
            format_last_used(Some("2024-03-05T07:08:09+03:00")),
            "2024.03.05 07:08:09"
        );
        assert_eq!(
            format_last_used(Some("2024-03-05T07:08:09.5")),
            "2024.03.05 07:08:09"
        );
        assert_eq!(format_last_used(Some("garbage")), NEVER_USED);
        assert_eq!(format_last_used(Some("")), NEVER_USED);
    }

    #[test]
    fn test_notice_codes_round_trip() {
        for notice in [
            Notice::Updated,
            Notice::EmptyAfterCleaning,
            Notice::NoValidSuggestion,
            Notice::Duplicate,
            Notice::NotFound,
        ] {
            assert_eq!(Notice::from_code(notice.code()), Some(notice));
            assert!(notice.location().is_ascii());
        }
        assert_eq!(Notice::from_code("<script>"), None);
    }

    #[test]
    fn test_index_shows_admin_link_only_for_admins() {
        assert!(index_page("root", true, 3).contains(r#"href="/admin""#));
        let page = index_page("alice", false, 3);
        assert!(!page.contains(r#"href="/admin""#));
        assert!(page.contains("Всего слов в базе: 3"));
    }

    #[test]
    fn test_login_page_escapes_username_and_error() {
        let page = login_page("<x>", Some("Неверный логин или пароль."));
        assert!(page.contains(r#"value="&lt;x&gt;""#));
        assert!(page.contains("Неверный логин или пароль."));
        assert!(!login_page("", None).contains("color:#b00"));
    }

    #[test]
    fn test_words_page_pagination() {
        let rows = vec![row(1, "кот", None)];
        assert_eq!(words_page(&rows, 0, 1, 200).total_pages(), 1);
        assert_eq!(words_page(&rows, 401, 1, 200).total_pages(), 3);

        let first = words_page(&rows, 401, 1, 200).render();
        assert!(first.contains("<span>Prev</span>"));
        assert!(first.contains("page=2&amp;per_page=200&amp;order=alpha"));

        let last = words_page(&rows, 401, 3, 200).render();
        assert!(last.contains("<span>Next</span>"));
        assert!(last.contains("Страница 3 / 3"));
    }

    #[test]
    fn test_words_page_rows_and_notice() {
        let rows = vec![
            row(7, "<кот>", Some("2024-01-02T03:04:05.000000Z")),
            row(8, "пёс", None),
        ];
        let mut page = words_page(&rows, 2, 1, 200);
        page.notice = Some(Notice::Duplicate);
        let html = page.render();

        assert!(html.contains("&lt;кот&gt;"));
        assert!(!html.contains("<кот>"));
        assert!(html.contains(r#"name="word_id" value="7""#));
        assert!(html.contains("2024.01.02 03:04:05"));
        assert!(html.contains(NEVER_USED));
        assert!(html.contains("Такое слово уже есть в базе"));
    }

    #[test]
    fn test_admin_page_lists_users() {
        let users = vec![UserSummary {
            id: 1,
            username: "root".to_string(),
            is_admin: true,
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }];
        let html = admin_page("root", &users);
        assert!(html.contains("<td>root</td><td>да</td>"));
        assert!(html.contains(r#"<option value="root"></option>"#));
    }
}
