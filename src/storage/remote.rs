use std::time::Duration;

use super::*;
use crate::prelude::{OrganizationDraft, OrganizationPatch, User, Version};
use reqwest::StatusCode;
use reqwest::blocking::{self, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

const ORGANIZATIONS: [&str; 2] = ["api", "organizations"];

#[derive(Debug, Serialize, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

/// Organization backend served by the CRM REST API.
///
/// Conflict detection happens on the server: every write carries the
/// caller's version in `If-Match` and a stale one comes back as `412`.
pub struct RemoteBackend {
    pub medium: String,
    pub base_url: Url,
    token: Option<String>,
    client: blocking::Client,
}

impl RemoteBackend {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "{} cannot be used as an API base URL",
                base_url
            )));
        }

        let client = blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            medium: "remote".to_string(),
            base_url,
            token,
            client,
        })
    }

    /// Profile of the signed-in user (`GET /api/me`).
    pub fn current_user(&self) -> Result<User, AppError> {
        let url = self.endpoint(&["api", "me"])?;
        let response = check_status(self.authorized(self.client.get(url)).send()?, "User")?;

        Ok(serde_json::from_str(&response.text()?)?)
    }

    /// Base URL extended with path segments, keeping any base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Validation("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn organization_endpoint(&self, id: &str) -> Result<Url, AppError> {
        self.endpoint(&[ORGANIZATIONS[0], ORGANIZATIONS[1], id])
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn json_body<T: Serialize + ?Sized>(
        request: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, AppError> {
        Ok(request
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?))
    }
}

impl OrganizationBackend for RemoteBackend {
    fn list(&self) -> Result<Vec<Organization>, AppError> {
        let url = self.endpoint(&ORGANIZATIONS)?;
        debug!(%url, "listing organizations");

        let response = self.authorized(self.client.get(url)).send()?;
        let response = check_status(response, "Organizations")?;

        let listing: Items<Organization> = serde_json::from_str(&response.text()?)?;
        Ok(listing.items)
    }

    fn create(&self, draft: OrganizationDraft) -> Result<Organization, AppError> {
        let url = self.endpoint(&ORGANIZATIONS)?;
        let request = Self::json_body(self.authorized(self.client.post(url)), &draft)?;

        let response = check_status(request.send()?, "Organizations")?;
        let org = read_organization(response)?;

        info!(id = %org.id, "organization created remotely");
        Ok(org)
    }

    fn update(
        &self,
        id: &str,
        patch: OrganizationPatch,
        expected: &Version,
    ) -> Result<Organization, AppError> {
        let url = self.organization_endpoint(id)?;
        let request = self
            .authorized(self.client.patch(url))
            .header(IF_MATCH, expected.as_str());
        let request = Self::json_body(request, &patch)?;

        let response = check_status(request.send()?, &format!("Organization {}", id))?;
        let org = read_organization(response)?;

        info!(id, "organization updated remotely");
        Ok(org)
    }

    fn delete(&self, id: &str, expected: &Version) -> Result<(), AppError> {
        let url = self.organization_endpoint(id)?;
        let request = self
            .authorized(self.client.delete(url))
            .header(IF_MATCH, expected.as_str());

        check_status(request.send()?, &format!("Organization {}", id))?;

        info!(id, "organization deleted remotely");
        Ok(())
    }

    fn replace_all(
        &self,
        organizations: Vec<Organization>,
    ) -> Result<Vec<Organization>, AppError> {
        let url = self.endpoint(&ORGANIZATIONS)?;
        let body = Items {
            items: organizations,
        };
        let request = Self::json_body(self.authorized(self.client.put(url)), &body)?;

        let response = check_status(request.send()?, "Organizations")?;
        let stored: Items<Organization> = serde_json::from_str(&response.text()?)?;

        info!(count = stored.items.len(), "organizations replaced remotely");
        Ok(stored.items)
    }

    fn get_medium(&self) -> &str {
        &self.medium
    }
}

/// Maps the statuses the API uses for business outcomes onto `AppError`;
/// any other non-success becomes `AppError::FailedRequest`.
fn check_status(response: Response, subject: &str) -> Result<Response, AppError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(AppError::NotFound(subject.to_string())),
        StatusCode::PRECONDITION_FAILED => {
            warn!(subject, "server rejected stale version");
            Err(AppError::VersionConflict(subject.to_string()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized),
        _ => Ok(response.error_for_status()?),
    }
}

fn read_organization(response: Response) -> Result<Organization, AppError> {
    let header_tag = response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(Version::from);

    let mut org: Organization = serde_json::from_str(&response.text()?)?;
    if org.version.is_none() {
        org.version = header_tag;
    }
    Ok(org)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, mock, server_url};

    // mockito 0.31 runs one shared server, so each test works under its own
    // base path to keep the mocks apart.
    fn backend(base: &str) -> RemoteBackend {
        RemoteBackend::new(&format!("{}/{}", server_url(), base), Some("tkn".to_string())).unwrap()
    }

    const ACME: &str = r#"{
        "id":"org-1",
        "name":"Acme",
        "website":"https://acme.test",
        "websiteStatus":"working",
        "countryRegion":"DE",
        "email":"info@acme.test",
        "category":"mobility-fleet-management",
        "status":"active",
        "createdAt":"2025-01-01T00:00:00Z",
        "updatedAt":"2025-01-02T00:00:00Z",
        "etag":"\"v2\""
    }"#;

    #[test]
    fn list_reads_items_with_bearer_token() {
        let _m = mock("GET", "/t-list/api/organizations")
            .match_header("authorization", "Bearer tkn")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"items":[{}]}}"#, ACME))
            .create();

        let orgs = backend("t-list").list().unwrap();

        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Acme");
        assert_eq!(orgs[0].version, Some(Version::new("\"v2\"")));
    }

    #[test]
    fn update_sends_if_match() {
        let m = mock("PATCH", "/t-update/api/organizations/org-1")
            .match_header("if-match", "\"v1\"")
            .match_body(Matcher::PartialJsonString(r#"{"name":"Acme"}"#.to_string()))
            .with_status(200)
            .with_body(ACME)
            .create();

        let patch = OrganizationPatch {
            name: Some("Acme".to_string()),
            ..Default::default()
        };
        let org = backend("t-update")
            .update("org-1", patch, &Version::new("\"v1\""))
            .unwrap();

        m.assert();
        assert_eq!(org.version, Some(Version::new("\"v2\"")));
    }

    #[test]
    fn precondition_failed_is_a_conflict() {
        let _m = mock("PATCH", "/t-conflict/api/organizations/org-1")
            .with_status(412)
            .create();

        let result = backend("t-conflict").update(
            "org-1",
            OrganizationPatch::default(),
            &Version::new("\"stale\""),
        );

        assert!(matches!(result, Err(AppError::VersionConflict(_))));
    }

    #[test]
    fn missing_organization_is_not_found() {
        let _m = mock("DELETE", "/t-missing/api/organizations/gone")
            .match_header("if-match", "\"v1\"")
            .with_status(404)
            .create();

        let result = backend("t-missing").delete("gone", &Version::new("\"v1\""));

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn etag_header_fills_missing_body_version() {
        let body = ACME.replace(r#""etag":"\"v2\"""#, r#""notes":"no tag""#);
        let _m = mock("POST", "/t-create/api/organizations")
            .with_status(201)
            .with_header("etag", "\"v7\"")
            .with_body(body)
            .create();

        let org = backend("t-create")
            .create(OrganizationDraft::new("Acme"))
            .unwrap();

        assert_eq!(org.version, Some(Version::new("\"v7\"")));
    }

    #[test]
    fn expired_session_and_server_errors() {
        let _a = mock("GET", "/t-auth/api/me").with_status(401).create();
        let _b = mock("GET", "/t-down/api/organizations")
            .with_status(500)
            .create();

        assert!(matches!(
            backend("t-auth").current_user(),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            backend("t-down").list(),
            Err(AppError::FailedRequest(_))
        ));
    }

    #[test]
    fn replace_all_puts_items() {
        let m = mock("PUT", "/t-replace/api/organizations")
            .match_body(Matcher::Regex(r#""items":\["#.to_string()))
            .with_status(200)
            .with_body(format!(r#"{{"items":[{}]}}"#, ACME))
            .create();

        let stored = backend("t-replace").replace_all(Vec::new()).unwrap();

        m.assert();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn validates_urls() {
        assert!(RemoteBackend::new("http://localhost:8080", None).is_ok());
        assert!(RemoteBackend::new("not a url", None).is_err());
        assert!(RemoteBackend::new("mailto:a@b.c", None).is_err());
    }
}
