diesel::table! {
    tickets (id) {
        id -> Integer,
        ticket_code -> Text,
        customer_id -> BigInt,
        subject -> Text,
        description -> Text,
        priority -> Text,
        status -> Text,
        assignee -> Text,
        created_at -> TimestamptzSqlite,
        updated_at -> TimestamptzSqlite,
    }
}

diesel::table! {
    customers (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        phone -> Text,
        status -> Text,
        since -> Text,
        created_at -> TimestamptzSqlite,
    }
}

diesel::table! {
    messages (id) {
        id -> Integer,
        ticket_id -> BigInt,
        sender -> Text,
        message -> Text,
        created_at -> TimestamptzSqlite,
    }
}
