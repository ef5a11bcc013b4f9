use warren_rabbitmq::{DsnChunks, Handle};

pub fn make_rabbitmq_handle() -> Handle {
    make_rabbitmq_handle_on(rabbitmq_port())
}

pub fn make_rabbitmq_handle_on(port: u16) -> Handle {
    Handle::new(
        "test_rabbitmq",
        DsnChunks {
            host: "localhost",
            port,
            user: "admin",
            password: "admin",
            vhost: "/",
        },
    )
}

fn rabbitmq_port() -> u16 {
    std::env::var("RABBITMQ_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5672)
}
