//! Feeds, post pages, publishing, editing, comments and the index cache

mod common;

use axum::http::StatusCode;
use common::*;
use yatube_server::db::{CommentRepo, PostRepo};
use yatube_server::models::Paginator;

#[tokio::test]
async fn index_shows_ten_posts_per_page() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    for i in 0..13 {
        app.post(&author, &format!("Тестовый пост {i}"), None).await;
    }

    let first = app.get("/", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(template(&first), "index.html");
    assert_eq!(page_len(&first), 10);
    assert_eq!(context(&first)["page"]["num_pages"], 2);

    let second = app.get("/?page=2", None).await;
    assert_eq!(page_len(&second), 3);

    // Out of range and junk page numbers clamp
    assert_eq!(page_len(&app.get("/?page=99", None).await), 3);
    assert_eq!(page_len(&app.get("/?page=abc", None).await), 10);
}

#[tokio::test]
async fn index_lists_newest_first_with_author_and_group() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let group = app.group("testSlug").await;
    app.post(&author, "older", None).await;
    app.post(&author, "newest", Some(&group)).await;

    let response = app.get("/", None).await;
    let first = &context(&response)["page"]["object_list"][0];
    assert_eq!(first["text"], "newest");
    assert_eq!(first["author"]["username"], "TestUser");
    assert_eq!(first["group"]["slug"], "testSlug");

    let body = body_text(response).await;
    assert!(body.contains("newest"));
    assert!(body.contains("/group/testSlug/"));
}

#[tokio::test]
async fn group_page_shows_only_its_posts_five_per_page() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let group = app.group("testSlug").await;
    let other = app.group("other").await;
    for i in 0..7 {
        app.post(&author, &format!("в группе {i}"), Some(&group)).await;
    }
    app.post(&author, "в другой группе", Some(&other)).await;

    let response = app.get("/group/testSlug/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "group.html");
    assert_eq!(page_len(&response), 5);
    assert_eq!(context(&response)["group"]["slug"], "testSlug");
    assert_eq!(context(&response)["page"]["count"], 7);

    let second = app.get("/group/testSlug/?page=2", None).await;
    assert_eq!(page_len(&second), 2);
    let texts: Vec<_> = context(&second)["page"]["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap().to_owned())
        .collect();
    assert!(texts.iter().all(|t| t.starts_with("в группе")));
}

#[tokio::test]
async fn unknown_group_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/group/nope/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(template(&response), "misc/404.html");
}

#[tokio::test]
async fn profile_paginates_author_posts() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let other = app.user("other").await;
    for i in 0..13 {
        app.post(&author, &format!("пост {i}"), None).await;
    }
    app.post(&other, "чужой пост", None).await;

    let response = app.get("/TestUser/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "profile.html");
    assert_eq!(page_len(&response), 10);
    assert_eq!(context(&response)["post_count"], 13);
    assert_eq!(context(&response)["author"]["username"], "TestUser");
    assert_eq!(context(&response)["following"], false);

    assert_eq!(page_len(&app.get("/TestUser/?page=2", None).await), 3);
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/ghost/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(context(&response)["path"], "/ghost/");
}

#[tokio::test]
async fn post_page_has_author_count_and_comments() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let reader = app.user("reader").await;
    app.post(&author, "первый", None).await;
    let post = app.post(&author, "второй", None).await;

    let text = yatube_server::models::CommentText::new("Отличный пост").unwrap();
    CommentRepo::new(app.state.pool())
        .create(post.id, reader.id, &text)
        .await
        .unwrap();

    let response = app.get(&format!("/TestUser/{}/", post.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "post.html");

    let ctx = context(&response);
    assert_eq!(ctx["post"]["text"], "второй");
    assert_eq!(ctx["posts_count"], 2);
    assert_eq!(ctx["author"]["username"], "TestUser");
    assert_eq!(ctx["comments"][0]["text"], "Отличный пост");
    assert_eq!(ctx["comments"][0]["author_username"], "reader");
    assert_eq!(ctx["form"]["fields"][0]["name"], "text");
}

#[tokio::test]
async fn post_only_resolves_under_its_author() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    app.user("other").await;
    let post = app.post(&author, "текст", None).await;

    let wrong_author = app.get(&format!("/other/{}/", post.id), None).await;
    assert_eq!(wrong_author.status(), StatusCode::NOT_FOUND);

    let missing = app.get("/TestUser/18273/", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let not_a_number = app.get("/TestUser/abc/", None).await;
    assert_eq!(not_a_number.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_new_post_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.get("/new", None).await;
    assert_eq!(location(&response), "/auth/login/?next=/new");

    let response = app.post_form("/new", None, &[("text", "sneaky")]).await;
    assert_eq!(location(&response), "/auth/login/?next=/new");

    let page = PostRepo::new(app.state.pool())
        .list_all(Paginator::new(10), None)
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn new_post_form_fields() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;
    app.group("testSlug").await;

    let response = app.get("/new", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "new_post.html");

    let ctx = context(&response);
    assert_eq!(ctx["is_edit"], false);
    let fields = ctx["form"]["fields"].as_array().unwrap();
    let widgets: Vec<_> = fields.iter().map(|f| f["widget"].as_str().unwrap()).collect();
    assert_eq!(widgets, ["textarea", "select", "file"]);
    assert_eq!(fields[0]["label"], "текст");
    assert_eq!(fields[0]["help_text"], "Введите текст новой записи");
    // Empty choice plus the group
    assert_eq!(fields[1]["choices"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn creating_a_post_redirects_to_index() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;
    let group = app.group("testSlug").await;

    let response = app
        .post_form(
            "/new",
            Some(&cookie),
            &[("text", "Новый пост"), ("group", &group.id.to_string())],
        )
        .await;
    assert_eq!(location(&response), "/");

    let page = PostRepo::new(app.state.pool())
        .list_for_group(group.id, Paginator::new(10), None)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.object_list[0].text, "Новый пост");
    assert_eq!(page.object_list[0].author.username, "TestUser");
}

#[tokio::test]
async fn invalid_post_rerenders_form_with_errors() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;

    let response = app
        .post_form("/new", Some(&cookie), &[("text", "  "), ("group", "999")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "new_post.html");

    let ctx = context(&response);
    assert_eq!(ctx["form"]["is_bound"], true);
    assert_eq!(ctx["form"]["fields"][0]["errors"][0], "Обязательное поле.");
    assert_eq!(ctx["form"]["fields"][1]["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn post_with_image_is_stored_and_served() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;

    let response = app
        .post_multipart(
            "/new",
            Some(&cookie),
            &[("text", "С картинкой"), ("group", "")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(location(&response), "/");

    let index = app.get("/", None).await;
    let image = context(&index)["page"]["object_list"][0]["image"]
        .as_str()
        .expect("image path")
        .to_owned();
    assert!(image.starts_with("posts/") && image.ends_with(".gif"));
    assert!(app.media.path().join(&image).exists());

    let served = app.get(&format!("/media/{image}"), None).await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;

    let response = app
        .post_multipart(
            "/new",
            Some(&cookie),
            &[("text", "С картинкой")],
            Some(("image", "fake.gif", b"definitely not a gif")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let errors = &context(&response)["form"]["fields"][2]["errors"];
    assert!(errors[0].as_str().unwrap().starts_with("Загрузите правильное изображение"));
}

#[tokio::test]
async fn author_can_edit_post() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let cookie = app.login(&author).await;
    let group = app.group("testSlug").await;
    let post = app.post(&author, "исходный", None).await;
    let edit_url = format!("/TestUser/{}/edit/", post.id);

    let form = app.get(&edit_url, Some(&cookie)).await;
    assert_eq!(template(&form), "new_post.html");
    assert_eq!(context(&form)["is_edit"], true);
    assert_eq!(context(&form)["form"]["fields"][0]["value"], "исходный");

    let response = app
        .post_form(
            &edit_url,
            Some(&cookie),
            &[("text", "исправленный"), ("group", &group.id.to_string())],
        )
        .await;
    assert_eq!(location(&response), format!("/TestUser/{}/", post.id));

    let updated = PostRepo::new(app.state.pool()).get(post.id).await.unwrap();
    assert_eq!(updated.text, "исправленный");
    assert_eq!(updated.group.unwrap().slug, "testSlug");
    assert_eq!(updated.pub_date, post.pub_date);
}

#[tokio::test]
async fn edit_can_replace_image() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let cookie = app.login(&author).await;
    let post = app.post(&author, "без картинки", None).await;
    let edit_url = format!("/TestUser/{}/edit/", post.id);

    let response = app
        .post_multipart(
            &edit_url,
            Some(&cookie),
            &[("text", "с картинкой")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let updated = PostRepo::new(app.state.pool()).get(post.id).await.unwrap();
    let image = updated.image.expect("image stored");
    assert!(app.media.path().join(&image).exists());

    let cleared = app
        .post_multipart(
            &edit_url,
            Some(&cookie),
            &[("text", "снова без картинки"), ("image-clear", "on")],
            None,
        )
        .await;
    assert_eq!(cleared.status(), StatusCode::FOUND);
    let updated = PostRepo::new(app.state.pool()).get(post.id).await.unwrap();
    assert_eq!(updated.image, None);
    assert!(!app.media.path().join(&image).exists());
}

#[tokio::test]
async fn image_and_clear_together_is_rejected() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let cookie = app.login(&author).await;
    let post = app.post(&author, "без картинки", None).await;

    let response = app
        .post_multipart(
            &format!("/TestUser/{}/edit/", post.id),
            Some(&cookie),
            &[("text", "с картинкой"), ("image-clear", "on")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(template(&response), "new_post.html");
    let errors = &context(&response)["form"]["fields"][2]["errors"];
    assert!(errors[0].as_str().unwrap().contains("но не оба"));

    let unchanged = PostRepo::new(app.state.pool()).get(post.id).await.unwrap();
    assert_eq!(unchanged.text, "без картинки");
    assert_eq!(media_files(&app), 0);
}

fn media_files(app: &TestApp) -> usize {
    std::fs::read_dir(app.media.path().join("posts"))
        .map(|dir| dir.count())
        .unwrap_or(0)
}

async fn reject_writes(app: &TestApp, event: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER reject_{event} BEFORE {event} ON posts BEGIN SELECT RAISE(ABORT, 'read only'); END"
    ))
    .execute(app.state.pool())
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_create_leaves_no_upload_behind() {
    let app = TestApp::new().await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;
    reject_writes(&app, "INSERT").await;

    let response = app
        .post_multipart(
            "/new",
            Some(&cookie),
            &[("text", "С картинкой")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(media_files(&app), 0);
}

#[tokio::test]
async fn failed_edit_leaves_no_upload_behind() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let cookie = app.login(&author).await;
    let post = app.post(&author, "исходный", None).await;
    reject_writes(&app, "UPDATE").await;

    let response = app
        .post_multipart(
            &format!("/TestUser/{}/edit/", post.id),
            Some(&cookie),
            &[("text", "с картинкой")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(media_files(&app), 0);
}

#[tokio::test]
async fn non_author_edit_redirects_to_post() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let intruder = app.user("intruder").await;
    let cookie = app.login(&intruder).await;
    let post = app.post(&author, "исходный", None).await;
    let edit_url = format!("/TestUser/{}/edit/", post.id);
    let post_url = format!("/TestUser/{}/", post.id);

    assert_eq!(location(&app.get(&edit_url, Some(&cookie)).await), post_url);
    assert_eq!(
        location(&app.post_form(&edit_url, Some(&cookie), &[("text", "взлом")]).await),
        post_url
    );

    let unchanged = PostRepo::new(app.state.pool()).get(post.id).await.unwrap();
    assert_eq!(unchanged.text, "исходный");
}

#[tokio::test]
async fn anonymous_edit_redirects_to_login() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let post = app.post(&author, "исходный", None).await;

    let response = app.get(&format!("/TestUser/{}/edit/", post.id), None).await;
    assert_eq!(
        location(&response),
        format!("/auth/login/?next=/TestUser/{}/edit/", post.id)
    );
}

#[tokio::test]
async fn only_signed_in_users_comment() {
    let app = TestApp::new().await;
    let author = app.user("TestUser").await;
    let reader = app.user("reader").await;
    let post = app.post(&author, "пост", None).await;
    let comment_url = format!("/TestUser/{}/comment", post.id);
    let post_url = format!("/TestUser/{}/", post.id);

    let anonymous = app.post_form(&comment_url, None, &[("text", "аноним")]).await;
    assert!(location(&anonymous).starts_with("/auth/login/?next="));

    let cookie = app.login(&reader).await;
    let response = app
        .post_form(&comment_url, Some(&cookie), &[("text", "Отличный пост")])
        .await;
    assert_eq!(location(&response), post_url);

    // Empty comments are dropped, the reader still lands on the post
    let empty = app.post_form(&comment_url, Some(&cookie), &[("text", "")]).await;
    assert_eq!(location(&empty), post_url);

    let comments = CommentRepo::new(app.state.pool())
        .list_for_post(post.id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Отличный пост");
    assert_eq!(comments[0].author_username, "reader");
}

#[tokio::test]
async fn index_is_cached_until_expiry() {
    let app = TestApp::with_cache_ttl(20).await;
    let author = app.user("TestUser").await;
    app.post(&author, "до кеша", None).await;

    let before = body_text(app.get("/", None).await).await;
    app.post(&author, "после кеша", None).await;

    let cached = app.get("/", None).await;
    assert_eq!(template(&cached), "index.html");
    let cached = body_text(cached).await;
    assert_eq!(before, cached);
    assert!(!cached.contains("после кеша"));

    // Other pages are not cached
    assert!(body_text(app.get("/TestUser/", None).await)
        .await
        .contains("после кеша"));

    app.state.index_cache().clear();
    let fresh = body_text(app.get("/", None).await).await;
    assert!(fresh.contains("после кеша"));
}

#[tokio::test]
async fn cache_keeps_viewers_apart() {
    let app = TestApp::with_cache_ttl(20).await;
    let user = app.user("TestUser").await;
    let cookie = app.login(&user).await;

    let anonymous = app.get("/", None).await;
    assert!(context(&anonymous)["user"].is_null());

    let signed_in = app.get("/", Some(&cookie)).await;
    assert_eq!(context(&signed_in)["user"]["username"], "TestUser");
}
