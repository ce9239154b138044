//! Service: builds cases for CRUD-style verbs
//!
//! A [`Service`] knows a base URL and a handler. Each verb method returns a
//! ready [`Case`] whose URL is the base plus the given path segments. With a
//! [`Noun`] attached, `list`/`create` target the plural path and
//! `retrieve`/`update`/`delete` the singular one.

use std::fmt;
use std::sync::Arc;

use restit_domain::paths::{Noun, Paths, join_url, validate_base_url};
use restit_domain::request::{HttpMethod, RequestSpec};
use serde::Serialize;

use crate::case::Case;
use crate::error::ApplicationResult;
use crate::ports::Handler;

/// Which noun form a verb addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Singular,
    Plural,
}

/// A RESTful service under test.
#[derive(Clone)]
pub struct Service {
    base_url: String,
    handler: Arc<dyn Handler>,
    paths: Option<Paths>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("base_url", &self.base_url)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Creates a service at `base_url`, absolute or path-only.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` looks absolute but is not a valid URL.
    pub fn new(
        base_url: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> ApplicationResult<Self> {
        Self::with_handler(base_url, Arc::new(handler))
    }

    /// Like [`Service::new`], sharing an existing handler.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` looks absolute but is not a valid URL.
    pub fn with_handler(
        base_url: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> ApplicationResult<Self> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;
        Ok(Self {
            base_url,
            handler,
            paths: None,
        })
    }

    /// Addresses resources through `noun`'s singular and plural paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry the noun paths.
    pub fn with_noun(mut self, noun: Noun) -> ApplicationResult<Self> {
        self.paths = Some(Paths::new(&self.base_url, noun)?);
        Ok(self)
    }

    /// The base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The handler shared by every case of this service.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    /// Builds a case for `method` at the base URL plus `paths`.
    ///
    /// `payload` is sent JSON-encoded; with `None` the body is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn new_case<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        payload: Option<&T>,
        paths: &[&str],
    ) -> ApplicationResult<Case> {
        let url = join_url(&self.base_url, paths)?;
        self.case_at(method, url, payload)
    }

    /// GET on the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn list(&self, paths: &[&str]) -> ApplicationResult<Case> {
        self.verb::<()>(HttpMethod::Get, Form::Plural, None, paths)
    }

    /// POST of a JSON payload to the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn create<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        paths: &[&str],
    ) -> ApplicationResult<Case> {
        self.verb(HttpMethod::Post, Form::Plural, Some(payload), paths)
    }

    /// GET on a single entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn retrieve(&self, paths: &[&str]) -> ApplicationResult<Case> {
        self.verb::<()>(HttpMethod::Get, Form::Singular, None, paths)
    }

    /// PUT of a JSON payload to a single entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn update<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        paths: &[&str],
    ) -> ApplicationResult<Case> {
        self.verb(HttpMethod::Put, Form::Singular, Some(payload), paths)
    }

    /// DELETE on a single entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn delete(&self, paths: &[&str]) -> ApplicationResult<Case> {
        self.verb::<()>(HttpMethod::Delete, Form::Singular, None, paths)
    }

    fn verb<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        form: Form,
        payload: Option<&T>,
        paths: &[&str],
    ) -> ApplicationResult<Case> {
        match &self.paths {
            Some(noun_paths) => {
                let url = match form {
                    Form::Singular => noun_paths.singular(paths),
                    Form::Plural => noun_paths.plural(paths),
                };
                self.case_at(method, url, payload)
            }
            None => self.new_case(method, payload, paths),
        }
    }

    fn case_at<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: String,
        payload: Option<&T>,
    ) -> ApplicationResult<Case> {
        let request = RequestSpec::json(method, url, payload)?;
        Ok(Case::new(request, Arc::clone(&self.handler)))
    }
}
