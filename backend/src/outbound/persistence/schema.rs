//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate them
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Gift-exchange events.
    events (id) {
        id -> Uuid,
        title -> Text,
        /// Identity subject of the organiser; always an admin.
        created_by -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Invitees of an event.
    ///
    /// `invite_token` is globally unique. `(event_id, bound_identity)` is
    /// unique so one identity binds at most one slot per event.
    participants (id) {
        id -> Uuid,
        event_id -> Uuid,
        display_name -> Nullable<Text>,
        /// Lower-case email, unique per event.
        email -> Text,
        is_admin -> Bool,
        joined -> Bool,
        bound_identity -> Nullable<Text>,
        invite_token -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed "may not draw" rules.
    exclusions (event_id, giver_id, receiver_id) {
        event_id -> Uuid,
        giver_id -> Uuid,
        receiver_id -> Uuid,
    }
}

diesel::table! {
    /// Committed giver-to-receiver pairings.
    assignments (event_id, giver_id) {
        event_id -> Uuid,
        giver_id -> Uuid,
        receiver_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Draw lifecycle and audit record, one row per event.
    draw_runs (event_id) {
        event_id -> Uuid,
        status -> Text,
        /// Solver seed stored as the big-endian reinterpretation of a `u64`.
        seed -> Nullable<Int8>,
        strategy -> Nullable<Text>,
        assignment_count -> Int4,
        committed_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(participants -> events (event_id));
diesel::joinable!(exclusions -> events (event_id));
diesel::joinable!(assignments -> events (event_id));
diesel::joinable!(draw_runs -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    events,
    participants,
    exclusions,
    assignments,
    draw_runs,
);
