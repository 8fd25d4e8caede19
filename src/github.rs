//! GitHub API

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::APP_NAME;
use crate::config::{BranchName, RepoSlug, Token};
use crate::remote::{FileWrite, RemoteError, RemoteStore, Revision};

/// Data returned by `GET /repos/{repo}/git/ref/heads/{branch}`
#[derive(Deserialize, Debug)]
pub struct GitRef {
    /// Commit the ref points at
    pub object: GitObject,
}

#[derive(Deserialize, Debug)]
pub struct GitObject {
    pub sha: Revision,
}

/// Data returned by `GET /repos/{repo}/contents/{path}` for a file
#[derive(Deserialize, Debug)]
pub struct ContentItem {
    /// Blob SHA of the file
    pub sha: Revision,
}

/// Body of `POST /repos/{repo}/git/refs`
#[derive(Serialize, Debug)]
pub struct CreateRef<'a> {
    /// Fully qualified, e.g. `refs/heads/main`
    pub r#ref: String,
    pub sha: &'a Revision,
}

/// [`RemoteStore`] backed by GitHub's REST API
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Token,
}

impl GitHubClient {
    /// Client for the API rooted at `api_url`, e.g. `https://api.github.com`
    pub fn new(api_url: &str, token: Token) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(APP_NAME)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn token(&self) -> &str {
        self.token.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// `/repos/{owner}/{name}` with both segments percent-encoded
    fn repo_url(&self, repo: &RepoSlug) -> String {
        self.url(&format!(
            "/repos/{}/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        ))
    }

    fn ref_url(&self, repo: &RepoSlug, branch: &BranchName) -> String {
        format!(
            "{}/git/ref/heads/{}",
            self.repo_url(repo),
            encode_path(&branch.to_string())
        )
    }

    fn contents_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(repo), encode_path(path))
    }

    fn get(&self, url: &str) -> RequestBuilder {
        log::trace!("GET {url}");
        self.client.get(url).bearer_auth(self.token())
    }

    /// Fetch `request`, treating 404 as "does not exist"
    async fn lookup<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Option<T>, RemoteError> {
        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = success_text(response).await?;

        serde_json::from_str::<T>(&text)
            .map(Some)
            .map_err(|err| RemoteError::Decode(format!("{err}\n{text}")))
    }
}

/// Body of a successful response, or the status and body of a failed one
async fn success_text(response: Response) -> Result<String, RemoteError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        Ok(text)
    } else {
        Err(RemoteError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Percent-encode every segment of a `/`-separated repository path
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

impl RemoteStore for GitHubClient {
    async fn branch_revision(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
    ) -> Result<Option<Revision>, RemoteError> {
        Self::lookup::<GitRef>(self.get(&self.ref_url(repo, branch)))
            .await
            .map(|git_ref| git_ref.map(|git_ref| git_ref.object.sha))
    }

    async fn create_branch(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
        revision: &Revision,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/git/refs", self.repo_url(repo));
        log::trace!("POST {url} refs/heads/{branch} -> {revision}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token())
            .json(&CreateRef {
                r#ref: format!("refs/heads/{branch}"),
                sha: revision,
            })
            .send()
            .await?;

        success_text(response).await.map(drop)
    }

    async fn file_revision(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
        path: &str,
    ) -> Result<Option<Revision>, RemoteError> {
        let url = self.contents_url(repo, path);

        Self::lookup::<ContentItem>(self.get(&url).query(&[("ref", branch.to_string())]))
            .await
            .map(|item| item.map(|item| item.sha))
    }

    async fn put_file(
        &self,
        repo: &RepoSlug,
        path: &str,
        write: &FileWrite,
    ) -> Result<(), RemoteError> {
        let url = self.contents_url(repo, path);
        log::trace!(
            "PUT {url} on {} ({})",
            write.branch,
            write.sha.as_ref().map_or("create", |_| "update")
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(self.token())
            .json(write)
            .send()
            .await?;

        success_text(response).await.map(drop)
    }
}
