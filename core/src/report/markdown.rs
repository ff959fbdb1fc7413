use crate::errors::ReportResult;
use crate::model::{Account, IamUser, OrgInventory};
use crate::signin::signin_url;

pub const GENERATED_NOTICE: &str =
    "> This page is automatically generated. Any manual changes will be lost.";

pub const ACCOUNT_HEADERS: [&str; 6] = [
    "AWS Account ID",
    "Account Name",
    "Account Email",
    "Created Date",
    "SIGNIN URL",
    "Description",
];

pub const USER_HEADERS: [&str; 3] = ["IAM User Name", "Access Key ID", "Description"];

const DATE_FORMAT: &str = "%Y-%m-%d";

struct Table<const N: usize> {
    headers: [&'static str; N],
    rows: Vec<[String; N]>,
}

impl<const N: usize> Table<N> {
    fn new(headers: [&'static str; N]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: [String; N]) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format_row(self.headers));
        out.push_str(&format_row(self.headers.map(|h| "-".repeat(h.len()))));
        for row in &self.rows {
            out.push_str(&format_row(row));
        }
        out
    }
}

fn format_row<I>(cells: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(cell.as_ref());
        line.push_str(" |");
    }
    line.push('\n');
    line
}

/// Makes free text safe inside a table cell: line breaks collapse to a single
/// space and `|` becomes `\|`.
pub fn escape_cell(value: &str) -> String {
    let flattened = value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    flattened.replace('|', "\\|")
}

pub fn render_accounts_table(accounts: &[Account]) -> ReportResult<String> {
    let mut table = Table::new(ACCOUNT_HEADERS);
    for account in accounts {
        let url = signin_url(&account.id)?;
        table.push([
            account.id.clone(),
            escape_cell(&account.name),
            escape_cell(&account.email),
            account
                .created_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            url,
            escape_cell(account.description()),
        ]);
    }
    Ok(table.render())
}

/// One row per access key; a user without keys still gets a single row.
pub fn render_users_table(users: &[IamUser]) -> String {
    let mut table = Table::new(USER_HEADERS);
    for user in users {
        let name = escape_cell(&user.name);
        let description = escape_cell(user.description());
        if user.access_keys.is_empty() {
            table.push([name, String::new(), description]);
            continue;
        }
        for key in &user.access_keys {
            table.push([name.clone(), escape_cell(&key.id), description.clone()]);
        }
    }
    table.render()
}

pub fn render_document(inventory: &OrgInventory) -> ReportResult<String> {
    let mut out = String::new();
    out.push_str(GENERATED_NOTICE);
    out.push_str("\n\n");
    out.push_str(&format!(
        "# AWS ROOT Organization Details for {}\n\n",
        escape_cell(&inventory.label)
    ));
    out.push_str(&render_accounts_table(&inventory.accounts)?);
    out.push('\n');
    out.push_str(&render_users_table(&inventory.users));
    Ok(out)
}

pub fn merge_documents(bodies: &[String]) -> String {
    bodies
        .iter()
        .map(|body| body.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
        + "\n"
}
