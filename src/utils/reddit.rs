use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

pub const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";
pub const PERMALINK_BASE: &str = "https://reddit.com";
pub const MAX_LISTING_LIMIT: u32 = 100;

const DELETED_AUTHOR: &str = "[deleted]";
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, String> {
        let client_id =
            std::env::var("REDDIT_CLIENT_ID").map_err(|_| "REDDIT_CLIENT_ID not set".to_string())?;
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET")
            .map_err(|_| "REDDIT_CLIENT_SECRET not set".to_string())?;
        let user_agent = std::env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| format!("chatguard/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    kind: String,
    data: CommentRecord,
}

#[derive(Debug, Deserialize)]
struct CommentRecord {
    id: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub permalink: String,
    pub subreddit: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub fn is_deleted(&self) -> bool {
        self.author.is_empty() || self.author == DELETED_AUTHOR
    }

    pub fn permalink_url(&self) -> String {
        if self.permalink.starts_with("http") {
            self.permalink.clone()
        } else {
            format!("{}{}", PERMALINK_BASE, self.permalink)
        }
    }
}

impl CommentRecord {
    fn into_comment(self) -> Comment {
        let created = Utc
            .timestamp_opt(self.created_utc as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Comment {
            id: self.id,
            author: self.author.unwrap_or_default(),
            body: self.body,
            permalink: self.permalink,
            subreddit: self.subreddit,
            created,
        }
    }
}

/// Parses a comment listing, returning comments oldest first.
pub fn parse_listing(body: &str) -> Result<Vec<Comment>, String> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse listing: {}", e))?;

    let mut comments: Vec<Comment> = listing
        .data
        .children
        .into_iter()
        .filter(|child| child.kind == "t1")
        .map(|child| child.data.into_comment())
        .collect();
    comments.reverse();
    Ok(comments)
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Application-only OAuth client for reading public comment listings.
pub struct RedditClient {
    http: reqwest::Client,
    credentials: Credentials,
    token: Option<AccessToken>,
}

impl RedditClient {
    pub fn new(credentials: Credentials) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .user_agent(credentials.user_agent.clone())
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            credentials,
            token: None,
        })
    }

    pub async fn authenticate(&mut self) -> Result<(), String> {
        let response = self
            .http
            .post(AUTH_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| format!("Auth request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Auth failed: {}", response.status()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Auth parse failed: {}", e))?;

        self.token = Some(AccessToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
        Ok(())
    }

    async fn bearer(&mut self) -> Result<String, String> {
        let fresh = self.token.as_ref().is_some_and(AccessToken::is_fresh);
        if !fresh {
            self.authenticate().await?;
        }
        self.token
            .as_ref()
            .map(|t| t.value.clone())
            .ok_or_else(|| "No access token".to_string())
    }

    /// Latest comments across `subreddits` (`a+b+c`), oldest first.
    pub async fn fetch_comments(
        &mut self,
        subreddits: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, String> {
        let token = self.bearer().await?;
        let url = format!(
            "{}/r/{}/comments?limit={}&raw_json=1",
            API_BASE,
            urlencoding::encode(subreddits).replace("%2B", "+"),
            limit.clamp(1, MAX_LISTING_LIMIT)
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.token = None;
            return Err("Access token rejected".to_string());
        }

        if !response.status().is_success() {
            return Err(format!("API error: {}", response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        parse_listing(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t1_c3",
            "children": [
                {"kind": "t1", "data": {
                    "id": "c3", "author": "someone", "body": "are you alone?",
                    "permalink": "/r/teenagers/comments/abc/x/c3/",
                    "subreddit": "teenagers", "created_utc": 1700000200.0
                }},
                {"kind": "t1", "data": {
                    "id": "c2", "author": "[deleted]", "body": "[removed]",
                    "permalink": "/r/teenagers/comments/abc/x/c2/",
                    "subreddit": "teenagers", "created_utc": 1700000100.0
                }},
                {"kind": "more", "data": {"id": "m1"}},
                {"kind": "t1", "data": {
                    "id": "c1", "author": "other", "body": "nice game",
                    "permalink": "/r/AskTeenBoys/comments/def/y/c1/",
                    "subreddit": "AskTeenBoys", "created_utc": 1700000000.0
                }}
            ]
        }
    }"#;

    #[test]
    fn test_parse_listing_oldest_first() {
        let comments = parse_listing(LISTING).unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
        assert_eq!(comments[0].created.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_deleted_author() {
        let comments = parse_listing(LISTING).unwrap();
        assert!(comments[1].is_deleted());
        assert!(!comments[2].is_deleted());
    }

    #[test]
    fn test_permalink_url() {
        let comments = parse_listing(LISTING).unwrap();
        assert_eq!(
            comments[2].permalink_url(),
            "https://reddit.com/r/teenagers/comments/abc/x/c3/"
        );
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        assert!(parse_listing("<html>rate limited</html>").is_err());
    }
}
