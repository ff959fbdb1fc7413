use crate::aws::{IamApi, OrganizationsApi};
use crate::errors::{ReportError, ReportResult};
use crate::model::{Account, IamUser, Page};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use tracing::{debug, info, warn};

/// Drains a continuation-token listing. `fetch` is called with `None` first and
/// then with each token the provider hands back, until it returns no token.
pub async fn collect_pages<T, F, Fut>(operation: &str, mut fetch: F) -> ReportResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ReportResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);
        let Some(token) = page.next.filter(|token| !token.is_empty()) else {
            break;
        };
        if !seen.insert(token.clone()) {
            return Err(ReportError::ServiceUnavailable(format!(
                "{} repeated continuation token after {} pages",
                operation, pages
            )));
        }
        cursor = Some(token);
    }
    debug!(operation, pages, items = items.len(), "pagination complete");
    Ok(items)
}

pub struct AccountEnumerator<'a> {
    api: &'a dyn OrganizationsApi,
}

impl<'a> AccountEnumerator<'a> {
    pub fn new(api: &'a dyn OrganizationsApi) -> Self {
        Self { api }
    }

    /// All member accounts in listing order, without tags.
    pub async fn accounts(&self) -> ReportResult<Vec<Account>> {
        let api = self.api;
        let listed =
            collect_pages("organizations:ListAccounts", move |token| api.list_accounts(token)).await?;

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(listed.len());
        for account in listed {
            if !seen.insert(account.id.clone()) {
                warn!(account_id = %account.id, "duplicate account in listing, keeping first");
                continue;
            }
            accounts.push(account);
        }
        info!(count = accounts.len(), "retrieved accounts");
        Ok(accounts)
    }

    pub async fn tags(&self, account_id: &str) -> ReportResult<BTreeMap<String, String>> {
        let api = self.api;
        let tags = collect_pages("organizations:ListTagsForResource", move |token| {
            api.list_tags(account_id, token)
        })
        .await?;
        Ok(tags.into_iter().collect())
    }

    /// Accounts with their tag maps filled in. An account that disappears
    /// between the listing and the tag lookup keeps an empty tag map.
    pub async fn accounts_with_tags(&self) -> ReportResult<Vec<Account>> {
        let mut accounts = self.accounts().await?;
        for account in &mut accounts {
            match self.tags(&account.id).await {
                Ok(tags) => account.tags = tags,
                Err(err) if err.is_not_found() => {
                    warn!(account_id = %account.id, error = %err, "account vanished before tag lookup");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(accounts)
    }
}

pub struct UserEnumerator<'a> {
    api: &'a dyn IamApi,
}

impl<'a> UserEnumerator<'a> {
    pub fn new(api: &'a dyn IamApi) -> Self {
        Self { api }
    }

    /// IAM users with access keys and tags, in listing order. Users deleted
    /// while the run is in progress are skipped.
    pub async fn users(&self) -> ReportResult<Vec<IamUser>> {
        let api = self.api;
        let names = collect_pages("iam:ListUsers", move |marker| api.list_users(marker)).await?;

        let mut users = Vec::with_capacity(names.len());
        for name in names {
            match self.user(&name).await {
                Ok(user) => users.push(user),
                Err(err) if err.is_not_found() => {
                    warn!(user = %name, error = %err, "user vanished mid-enumeration, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        info!(count = users.len(), "retrieved IAM users");
        Ok(users)
    }

    pub async fn user(&self, name: &str) -> ReportResult<IamUser> {
        let api = self.api;
        let access_keys = collect_pages("iam:ListAccessKeys", move |marker| {
            api.list_access_keys(name, marker)
        })
        .await?;
        let tags = collect_pages("iam:ListUserTags", move |marker| api.list_user_tags(name, marker))
            .await?;
        Ok(IamUser {
            name: name.to_string(),
            access_keys,
            tags: tags.into_iter().collect(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn follows_account_pages_until_exhausted() {
        let api = FakeOrganizations {
            account_pages: vec![
                vec![account("111111111111", "One"), account("222222222222", "Two")],
                vec![account("333333333333", "Three")],
                vec![account("444444444444", "Four")],
            ],
            ..Default::default()
        };
        let accounts = AccountEnumerator::new(&api).accounts().await.expect("accounts");
        let ids: Vec<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["111111111111", "222222222222", "333333333333", "444444444444"]);
        assert_eq!(
            *api.calls.lock().expect("calls lock"),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    async fn enumeration_is_restartable() {
        let api = FakeOrganizations {
            account_pages: vec![vec![account("111111111111", "One")], vec![account("222222222222", "Two")]],
            ..Default::default()
        };
        let enumerator = AccountEnumerator::new(&api);
        let first = enumerator.accounts().await.expect("first run");
        let second = enumerator.accounts().await.expect("second run");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn drops_duplicate_account_ids() {
        let api = FakeOrganizations {
            account_pages: vec![
                vec![account("111111111111", "One")],
                vec![account("111111111111", "One again"), account("222222222222", "Two")],
            ],
            ..Default::default()
        };
        let accounts = AccountEnumerator::new(&api).accounts().await.expect("accounts");
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "One");
    }

    #[tokio::test]
    async fn fills_tags_and_defaults_to_empty() {
        let mut tags = HashMap::new();
        tags.insert(
            "111111111111".to_string(),
            vec![
                ("Description".to_string(), "Shared services".to_string()),
                ("Owner".to_string(), "platform".to_string()),
            ],
        );
        let api = FakeOrganizations {
            account_pages: vec![vec![account("111111111111", "One"), account("222222222222", "Two")]],
            tags,
            ..Default::default()
        };
        let accounts = AccountEnumerator::new(&api)
            .accounts_with_tags()
            .await
            .expect("accounts");
        assert_eq!(accounts[0].description(), "Shared services");
        assert_eq!(accounts[0].tags.get("Owner").map(String::as_str), Some("platform"));
        assert!(accounts[1].tags.is_empty());
        assert_eq!(accounts[1].description(), "");
    }

    #[tokio::test]
    async fn surfaces_access_denied() {
        let api = FakeOrganizations {
            deny_listing: true,
            ..Default::default()
        };
        let err = AccountEnumerator::new(&api).accounts().await.expect_err("denied");
        assert!(matches!(err, ReportError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn stops_on_repeated_token() {
        let err = collect_pages("test:Loop", |_token| async {
            Ok(Page {
                items: vec![1u8],
                next: Some("same".to_string()),
            })
        })
        .await
        .expect_err("loop");
        assert!(matches!(err, ReportError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn users_carry_paged_keys_and_tags() {
        let mut keys = HashMap::new();
        keys.insert(
            "example-user".to_string(),
            vec![vec![key("AKIAEXAMPLE1")], vec![key("AKIAEXAMPLE2")]],
        );
        let mut tags = HashMap::new();
        tags.insert(
            "example-user".to_string(),
            vec![("description".to_string(), "CI deployer".to_string())],
        );
        let api = FakeIam {
            user_pages: vec![vec!["example-user".to_string()], vec!["no-keys".to_string()]],
            keys,
            tags,
            ..Default::default()
        };
        let users = UserEnumerator::new(&api).users().await.expect("users");
        assert_eq!(users.len(), 2);
        let key_ids: Vec<&str> = users[0].access_keys.iter().map(|k| k.id.as_str()).collect();
        assert_eq!(key_ids, ["AKIAEXAMPLE1", "AKIAEXAMPLE2"]);
        assert_eq!(users[0].description(), "CI deployer");
        assert!(users[1].access_keys.is_empty());
    }

    #[tokio::test]
    async fn skips_users_deleted_mid_run() {
        let api = FakeIam {
            user_pages: vec![vec!["alice".to_string(), "ghost".to_string(), "bob".to_string()]],
            vanished: vec!["ghost".to_string()],
            ..Default::default()
        };
        let users = UserEnumerator::new(&api).users().await.expect("users");
        let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn user_listing_denied_is_fatal() {
        let api = FakeIam {
            denied: true,
            ..Default::default()
        };
        let err = UserEnumerator::new(&api).users().await.expect_err("denied");
        assert!(matches!(err, ReportError::AccessDenied(_)));
    }
}
