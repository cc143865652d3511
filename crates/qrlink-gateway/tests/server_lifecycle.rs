use qrlink_gateway::Config;
use qrlink_tokens::{
    unix_now, Issuer, Payload, RedirectBase, SignatureMode, SigningKey, Ttl,
};

fn config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        signature: SignatureMode::Required(SigningKey::new("s3cr3t").unwrap()),
        ttl: Ttl::default(),
        redirect_base: RedirectBase::new("https://app.example.test"),
    }
}

#[tokio::test]
async fn serves_verify_over_tcp_and_shuts_down() {
    let server = qrlink_gateway::start(&config()).await.unwrap();
    let addr = server.addr();

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let health = client
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status().as_u16(), 200);

    let now = unix_now();
    let token = Issuer::mint(
        &SigningKey::new("s3cr3t").unwrap(),
        &Payload::new(now).with_email("user@example.com"),
        "n",
    );
    let res = client
        .get(format!("http://{addr}/verify?t={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 302);
    assert_eq!(
        res.headers().get("location").unwrap().to_str().unwrap(),
        format!("https://app.example.test/?e=user%40example.com&ts={now}")
    );

    drop(client);
    server.shutdown().await.unwrap();
    assert!(reqwest::get(format!("http://{addr}/healthz")).await.is_err());
}
