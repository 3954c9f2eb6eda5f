//! Reading and writing the auth token cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

/// The name of the cookie holding the backend-issued JWT.
pub const TOKEN_COOKIE: &str = "token";

/// The cookie operations the access gate needs.
pub trait CookieStore {
    /// The value of the cookie called `name`, if the client sent one.
    fn get(&self, name: &str) -> Option<String>;

    /// Store `value` in the cookie called `name`.
    fn set(&mut self, name: &str, value: &str);

    /// Delete the cookie called `name` on the client.
    ///
    /// Clearing a cookie that does not exist does nothing.
    fn clear(&mut self, name: &str);
}

/// A [CookieStore] backed by the request's cookie jar.
///
/// Changes are sent to the client by returning [JarCookieStore::into_jar] as
/// part of the response.
#[derive(Debug, Default, Clone)]
pub struct JarCookieStore {
    jar: CookieJar,
}

impl JarCookieStore {
    /// Wrap the cookies sent with a request.
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    /// The jar with any changes, ready to be returned in a response.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl CookieStore for JarCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_owned())
    }

    fn set(&mut self, name: &str, value: &str) {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(
            Cookie::build((name.to_owned(), value.to_owned()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        );
    }

    fn clear(&mut self, name: &str) {
        let jar = std::mem::take(&mut self.jar);
        // Only emits a removal cookie if the client sent the cookie.
        self.jar = jar.remove(Cookie::build((name.to_owned(), "")).path("/"));
    }
}

/// Store `token` in the auth cookie.
pub fn set_token_cookie(jar: CookieJar, token: &str) -> CookieJar {
    let mut store = JarCookieStore::new(jar);
    store.set(TOKEN_COOKIE, token);
    store.into_jar()
}

/// Delete the auth cookie on the client, if it has one.
pub fn clear_token_cookie(jar: CookieJar) -> CookieJar {
    let mut store = JarCookieStore::new(jar);
    store.clear(TOKEN_COOKIE);
    store.into_jar()
}
