#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::module_inception)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use tempfile::{tempdir, TempDir};

    use crate::config::{RateLimitConfig, SessionConfig};
    use crate::lessons::Lesson;
    use crate::store::UserStore;
    use crate::views::Views;

    use crate::http::{App, AppState, Blueprint, MountError};

    fn test_app_state(lifetime: Duration) -> AppState {
        AppState::new(
            Key::generate(),
            SessionConfig {
                cookie_name: String::from("session"),
                permanent_lifetime: lifetime,
                secure_cookies: false,
            },
            Views::builtin(),
        )
    }

    fn lesson_server(lesson: Lesson, state: AppState) -> Result<TestServer> {
        let router = lesson.app()?.into_router(state)?;
        TestServer::builder().save_cookies().build(router)
    }

    async fn temp_store() -> Result<(TempDir, UserStore)> {
        let dir = tempdir()?;
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("users.sqlite3").display()
        );
        let store = UserStore::connect(&url).await?;
        Ok((dir, store))
    }

    fn default_state(lesson: Lesson) -> AppState {
        test_app_state(lesson.default_session_lifetime())
    }

    #[tokio::test]
    async fn user_route_greets_path_parameter() -> Result<()> {
        let server = lesson_server(Lesson::Basics, default_state(Lesson::Basics))?;

        let response = server.get("/user/Sam").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "Hello Sam!");

        let escaped = server.get("/user/%3Cb%3E").await;
        assert_eq!(escaped.status_code(), StatusCode::OK);
        assert_eq!(escaped.text(), "Hello &lt;b&gt;!");
        Ok(())
    }

    #[tokio::test]
    async fn basics_redirects_admin_and_premium_user() -> Result<()> {
        let server = lesson_server(Lesson::Basics, default_state(Lesson::Basics))?;

        let admin = server.get("/admin").await;
        assert_eq!(admin.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(admin.header("location"), "/");

        let premium = server.get("/premium-user").await;
        assert_eq!(premium.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(premium.header("location"), "/user/Samm");

        let home = server.get("/").await;
        assert!(home.text().contains("<h1>HOMEPAGE</h1>"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_path_is_not_found_and_wrong_method_is_not_allowed() -> Result<()> {
        let server = lesson_server(Lesson::Basics, default_state(Lesson::Basics))?;

        let missing = server.get("/nope").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert!(missing.text().contains("Not Found"));

        let wrong_method = server.post("/user/Sam").await;
        assert_eq!(wrong_method.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        Ok(())
    }

    #[tokio::test]
    async fn responses_carry_request_id() -> Result<()> {
        let server = lesson_server(Lesson::Basics, default_state(Lesson::Basics))?;
        let response = server.get("/").await;
        assert!(response.headers().contains_key("x-request-id"));
        Ok(())
    }

    #[tokio::test]
    async fn templates_render_variables() -> Result<()> {
        let server = lesson_server(Lesson::Templates, default_state(Lesson::Templates))?;

        let user = server.get("/user/Sam").await;
        assert_eq!(user.status_code(), StatusCode::OK);
        let body = user.text();
        assert!(body.contains("Hello Sam!"));
        assert!(body.contains("Role: user"));
        assert!(body.contains("Age: 21"));

        let code = server.get("/python").await;
        assert!(code.text().contains("<li>9</li>"));
        assert!(!code.text().contains("<li>10</li>"));
        Ok(())
    }

    #[tokio::test]
    async fn inheritance_pages_share_navigation() -> Result<()> {
        let server = lesson_server(Lesson::Inheritance, default_state(Lesson::Inheritance))?;

        for path in ["/", "/new"] {
            let response = server.get(path).await;
            assert_eq!(response.status_code(), StatusCode::OK);
            assert!(response.text().contains("<nav>"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn methods_post_redirects_to_encoded_user_url() -> Result<()> {
        let server = lesson_server(Lesson::Methods, default_state(Lesson::Methods))?;

        let form = server.get("/").await;
        assert!(form.text().contains("method=\"post\""));

        let response = server.post("/").form(&[("name", "Sam Smith")]).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/user/Sam%20Smith");

        let greeting = server.get("/user/Sam%20Smith").await;
        assert_eq!(greeting.text(), "<h1>Hi Sam Smith!</h1>");
        Ok(())
    }

    #[tokio::test]
    async fn missing_form_field_is_bad_request() -> Result<()> {
        let server = lesson_server(Lesson::Methods, default_state(Lesson::Methods))?;

        let response = server.post("/").form(&[("other", "x")]).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.text().contains("name"));
        Ok(())
    }

    #[tokio::test]
    async fn login_then_user_page_shows_name() -> Result<()> {
        let server = lesson_server(Lesson::Sessions, default_state(Lesson::Sessions))?;

        let login = server.post("/login").form(&[("name", "Sam")]).await;
        assert_eq!(login.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(login.header("location"), "/user");

        let user = server.get("/user").await;
        assert_eq!(user.status_code(), StatusCode::OK);
        assert!(user.text().contains("Sam"));
        Ok(())
    }

    #[tokio::test]
    async fn logged_in_visitor_is_redirected_away_from_login() -> Result<()> {
        let server = lesson_server(Lesson::Sessions, default_state(Lesson::Sessions))?;

        let anonymous = server.get("/login").await;
        assert_eq!(anonymous.status_code(), StatusCode::OK);

        server.post("/login").form(&[("name", "Sam")]).await;
        let again = server.get("/login").await;
        assert_eq!(again.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(again.header("location"), "/user");
        Ok(())
    }

    #[tokio::test]
    async fn logout_returns_to_anonymous() -> Result<()> {
        let server = lesson_server(Lesson::Sessions, default_state(Lesson::Sessions))?;

        server.post("/login").form(&[("name", "Sam")]).await;
        let logout = server.get("/logout").await;
        assert_eq!(logout.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(logout.header("location"), "/login");

        let user = server.get("/user").await;
        assert_eq!(user.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(user.header("location"), "/login");
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_logout_is_a_plain_redirect() -> Result<()> {
        let server = lesson_server(Lesson::Flashing, default_state(Lesson::Flashing))?;

        let logout = server.get("/logout").await;
        assert_eq!(logout.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(logout.header("location"), "/login");

        let login = server.get("/login").await;
        assert_eq!(login.status_code(), StatusCode::OK);
        assert!(!login.text().contains("logged out"));
        Ok(())
    }

    #[tokio::test]
    async fn flash_is_shown_exactly_once() -> Result<()> {
        let server = lesson_server(Lesson::Flashing, default_state(Lesson::Flashing))?;

        server.post("/login").form(&[("name", "Sam")]).await;

        let first = server.get("/user").await;
        assert_eq!(first.status_code(), StatusCode::OK);
        assert!(first.text().contains("Login successfully"));

        let second = server.get("/user").await;
        assert_eq!(second.status_code(), StatusCode::OK);
        assert!(second.text().contains("Hi Sam!"));
        assert!(!second.text().contains("Login successfully"));
        Ok(())
    }

    #[tokio::test]
    async fn flashing_login_sets_permanent_cookie() -> Result<()> {
        let server = lesson_server(Lesson::Flashing, default_state(Lesson::Flashing))?;

        let login = server.post("/login").form(&[("name", "Sam")]).await;
        let set_cookie = login.header("set-cookie");
        let set_cookie = set_cookie.to_str()?;
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("Max-Age=604800"));
        assert!(set_cookie.contains("HttpOnly"));
        Ok(())
    }

    #[tokio::test]
    async fn already_logged_in_and_logout_messages_are_flashed() -> Result<()> {
        let server = lesson_server(Lesson::Flashing, default_state(Lesson::Flashing))?;

        server.post("/login").form(&[("name", "Sam")]).await;
        server.get("/user").await;

        let login = server.get("/login").await;
        assert_eq!(login.status_code(), StatusCode::SEE_OTHER);
        let user = server.get("/user").await;
        assert!(user.text().contains("Already logged in"));

        server.get("/logout").await;
        let after = server.get("/login").await;
        assert_eq!(after.status_code(), StatusCode::OK);
        assert!(after.text().contains("logged out successfully, Sam !"));
        Ok(())
    }

    #[tokio::test]
    async fn database_login_registers_and_updates_user() -> Result<()> {
        let (_dir, store) = temp_store().await?;
        let state = default_state(Lesson::Database).with_users(store.clone());
        let server = lesson_server(Lesson::Database, state)?;

        let welcome = server.get("/").await;
        assert!(welcome.text().contains("Please login"));

        let login = server.post("/login").form(&[("name", "Sam")]).await;
        assert_eq!(login.header("location"), "/user");
        let created = store.find_by_name("Sam").await?.expect("user registered");
        assert_eq!(created.email.as_deref(), Some(""));

        let update = server
            .post("/user")
            .form(&[("email", "sam@example.com")])
            .await;
        assert_eq!(update.status_code(), StatusCode::OK);
        assert!(update.text().contains("value=\"sam@example.com\""));

        let stored = store.find_by_name("Sam").await?.expect("user exists");
        assert_eq!(stored.email.as_deref(), Some("sam@example.com"));
        assert_eq!(store.all().await?.len(), 1);

        let display = server.get("/display").await;
        assert_eq!(display.status_code(), StatusCode::OK);
        assert!(display.text().contains("sam@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn database_login_restores_saved_email() -> Result<()> {
        let (_dir, store) = temp_store().await?;
        store.insert("Ada", "ada@example.com").await?;
        let state = default_state(Lesson::Database).with_users(store.clone());
        let server = lesson_server(Lesson::Database, state)?;

        server.post("/login").form(&[("name", "Ada")]).await;
        let user = server.get("/user").await;
        assert!(user.text().contains("value=\"ada@example.com\""));

        let logout = server.get("/logout").await;
        assert_eq!(logout.header("location"), "/login");
        let removal = logout.header("set-cookie");
        let removal = removal.to_str()?;
        assert!(removal.starts_with("session="));
        assert!(removal.contains("Max-Age=0"));

        let after = server.get("/user").await;
        assert_eq!(after.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(store.all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn database_user_update_requires_email_field() -> Result<()> {
        let (_dir, store) = temp_store().await?;
        let state = default_state(Lesson::Database).with_users(store);
        let server = lesson_server(Lesson::Database, state)?;

        server.post("/login").form(&[("name", "Sam")]).await;
        let response = server.post("/user").form(&[("mail", "x")]).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn database_routes_fail_cleanly_without_store() -> Result<()> {
        let server = lesson_server(Lesson::Database, default_state(Lesson::Database))?;
        let display = server.get("/display").await;
        assert_eq!(display.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn blueprint_lesson_mounts_side_and_admin() -> Result<()> {
        let server = lesson_server(Lesson::Blueprints, default_state(Lesson::Blueprints))?;

        assert_eq!(server.get("/").await.text(), "<h1>Homepage</h1>");
        assert_eq!(server.get("/home").await.text(), "<h1>Homepage</h1>");
        assert_eq!(server.get("/route/side/").await.text(), "<h1>Sidepage</h1>");
        assert!(server.get("/route/side/check").await.text().contains("Okay"));

        let admin = server.get("/admin/").await;
        assert_eq!(admin.status_code(), StatusCode::OK);
        assert!(admin.text().contains("Admin"));

        let bare = server.get("/admin").await;
        assert_eq!(bare.status_code(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(bare.header("location"), "/admin/");
        Ok(())
    }

    #[tokio::test]
    async fn modules_lesson_mounts_admin_blueprint() -> Result<()> {
        let server = lesson_server(Lesson::Modules, default_state(Lesson::Modules))?;

        assert_eq!(server.get("/").await.text(), "<h1>Homepage</h1>");
        assert!(server.get("/admin/").await.text().contains("Admin"));
        assert_eq!(
            server.get("/route/side/").await.status_code(),
            StatusCode::NOT_FOUND
        );
        Ok(())
    }

    #[tokio::test]
    async fn blueprint_resolution_ignores_registration_order() -> Result<()> {
        async fn admin_root() -> &'static str {
            "admin root"
        }
        async fn side_root() -> &'static str {
            "side root"
        }

        for admin_first in [true, false] {
            let admin = Blueprint::new("admin").route("/", get(admin_root));
            let side = Blueprint::new("side").route("/", get(side_root));
            let app = if admin_first {
                App::new()
                    .register_blueprint(admin, "/admin")?
                    .register_blueprint(side, "/route/side")?
            } else {
                App::new()
                    .register_blueprint(side, "/route/side")?
                    .register_blueprint(admin, "/admin")?
            };

            let server = TestServer::new(app.into_router(default_state(Lesson::Blueprints))?)?;
            assert_eq!(server.get("/admin/").await.text(), "admin root");
            assert_eq!(server.get("/route/side/").await.text(), "side root");
        }
        Ok(())
    }

    #[tokio::test]
    async fn conflicting_routes_are_rejected() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new()
            .route("/admin/", get(page))
            .register_blueprint(Blueprint::new("admin").route("/", get(page)), "/admin")?;
        let result = app.into_router(default_state(Lesson::Blueprints));
        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn routes_differing_only_in_parameter_names_conflict() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new()
            .route("/user/{name}", get(page))
            .route("/user/{usr}", get(page));
        let result = app.into_router(default_state(Lesson::Basics));
        assert!(matches!(
            result,
            Err(MountError::RouteConflict(path)) if path == "/user/{usr}"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn blueprints_sharing_a_prefix_cannot_both_serve_static_files() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new()
            .register_blueprint(
                Blueprint::new("a").static_folder("./a").route("/a", get(page)),
                "/shared",
            )?
            .register_blueprint(
                Blueprint::new("b").static_folder("./b").route("/b", get(page)),
                "/shared",
            )?;
        let result = app.into_router(default_state(Lesson::Blueprints));
        assert!(matches!(
            result,
            Err(MountError::RouteConflict(path)) if path == "/shared/static"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn root_blueprint_static_folder_collides_with_app_static() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new().static_folder("./static").register_blueprint(
            Blueprint::new("root")
                .static_folder("./root")
                .route("/page", get(page)),
            "/",
        )?;
        let result = app.into_router(default_state(Lesson::Blueprints));
        assert!(matches!(
            result,
            Err(MountError::RouteConflict(path)) if path == "/static"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn routes_under_a_static_mount_are_rejected() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new()
            .static_folder("./static")
            .route("/static/style.css", get(page));
        let result = app.into_router(default_state(Lesson::Basics));
        assert!(matches!(
            result,
            Err(MountError::RouteConflict(path)) if path == "/static/style.css"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn distinct_blueprint_static_folders_mount_together() -> Result<()> {
        async fn page() -> &'static str {
            "page"
        }

        let app = App::new()
            .static_folder("./static")
            .register_blueprint(
                Blueprint::new("side").static_folder("./side").route("/", get(page)),
                "/route/side",
            )?
            .register_blueprint(
                Blueprint::new("admin").static_folder("./admin").route("/", get(page)),
                "/admin",
            )?;
        let server = TestServer::new(app.into_router(default_state(Lesson::Blueprints))?)?;
        assert_eq!(server.get("/admin/").await.text(), "page");
        assert_eq!(server.get("/route/side/").await.text(), "page");
        Ok(())
    }

    #[tokio::test]
    async fn rate_limit_rejects_bursts() -> Result<()> {
        let app = Lesson::Basics.app()?.rate_limit(RateLimitConfig {
            replenish_ms: 60_000,
            burst: 1,
        });
        let server = TestServer::new(app.into_router(default_state(Lesson::Basics))?)?;

        assert_eq!(server.get("/").await.status_code(), StatusCode::OK);
        assert_eq!(
            server.get("/").await.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        Ok(())
    }
}
