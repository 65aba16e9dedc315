use claims::assert_err;
use claims::assert_none;
use claims::assert_some_eq;
use serde_json::json;
use wiremock::matchers::basic_auth;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_client;

/// The configured `newsletter` list resolves to its MailChimp id
#[tokio::test]
async fn status_uses_list_from_configuration() {
    let mut app = spawn_client().await;
    app.client.set_list_from_key("newsletter").unwrap();

    Mock::given(method("GET"))
        .and(path_regex("^/lists/abc123/members/[0-9a-f]{32}$"))
        // base.yaml key, without its `-us6` suffix
        .and(basic_auth("apikey", "0123456789abcdef0123456789abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "subscribed"})))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let record = app.client.status("john@foo.com").await;

    assert_some_eq!(record, json!({"status": "subscribed"}));
}

#[tokio::test]
async fn member_id_is_hash_of_lowercased_email() {
    let mut app = spawn_client().await;
    app.client.set_list("abc123");

    // md5("user@example.com")
    let member_path = "/lists/abc123/members/b58996c504c5638798eb6b511e6f49af";
    Mock::given(path(member_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(3)
        .mount(&app.mailchimp_server)
        .await;

    for email in ["User@Example.com", "user@example.com", "USER@EXAMPLE.COM"] {
        assert_some_eq!(app.client.status(email).await, json!({}), "{email}");
    }
}

#[tokio::test]
async fn unknown_list_key_is_rejected() {
    let mut app = spawn_client().await;
    assert_err!(app.client.set_list_from_key("no-such-list"));
    assert_eq!(app.client.list(), None);

    // nothing selected, nothing sent
    assert_none!(app.client.status("john@foo.com").await);
    assert_eq!(app.request_count().await, 0);
}

#[tokio::test]
async fn invalid_emails_are_never_sent() {
    let mut app = spawn_client().await;
    app.client.set_list_from_key("newsletter").unwrap();

    for email in ["", "john", "john@", "@foo.com", "john foo@bar.com"] {
        assert_none!(app.client.status(email).await, "{email}");
        assert_none!(app.client.unsubscribe(email).await, "{email}");
        assert_none!(app.client.delete(email).await, "{email}");
    }

    assert_eq!(app.request_count().await, 0);
}

/// 404 ("not a member") and 500 look exactly the same to the caller
#[tokio::test]
async fn error_statuses_are_indistinguishable() {
    for code in [404u16, 500] {
        let mut app = spawn_client().await;
        app.client.set_list_from_key("newsletter").unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(code).set_body_json(json!({
                "title": "Resource Not Found",
                "status": code,
            })))
            .expect(1)
            .mount(&app.mailchimp_server)
            .await;

        assert_none!(app.client.status("john@foo.com").await, "{code}");
    }
}

#[tokio::test]
async fn unsubscribe_then_delete() {
    let mut app = spawn_client().await;
    app.client.set_list_from_key("newsletter").unwrap();

    Mock::given(method("PATCH"))
        .and(path_regex("^/lists/abc123/members/[0-9a-f]{32}$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "unsubscribed"})),
        )
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/lists/abc123/members/[0-9a-f]{32}$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    assert_some_eq!(
        app.client.unsubscribe("john@foo.com").await,
        json!({"status": "unsubscribed"})
    );
    // MailChimp's delete answers with an empty body, which decodes to nothing
    assert_none!(app.client.delete("john@foo.com").await);
}
