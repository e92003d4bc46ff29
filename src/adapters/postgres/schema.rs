//! Diesel schema for the four aggregate tables.
//!
//! Each table stores the serialized aggregate in `data` alongside
//! denormalized columns for filtering; identifiers are caller-supplied
//! pattern-constrained strings, not generated keys.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier (`T-` prefix).
        #[max_length = 64]
        id -> Varchar,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Scheduling priority.
        #[max_length = 50]
        priority -> Varchar,
        /// Owning user.
        #[max_length = 255]
        owner -> Varchar,
        /// Primary project identifier.
        #[max_length = 64]
        project_id -> Varchar,
        /// Primary sprint identifier.
        #[max_length = 64]
        sprint_id -> Varchar,
        /// Full aggregate payload.
        data -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project records.
    projects (id) {
        /// Project identifier (`P-` prefix).
        #[max_length = 64]
        id -> Varchar,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Full aggregate payload.
        data -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Sprint records.
    sprints (id) {
        /// Sprint identifier (`S-` prefix).
        #[max_length = 64]
        id -> Varchar,
        /// Primary project identifier.
        #[max_length = 64]
        project_id -> Varchar,
        /// Full aggregate payload.
        data -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Action list records with nullable parent links.
    action_lists (id) {
        /// List identifier (`L-` prefix).
        #[max_length = 64]
        id -> Varchar,
        /// Linked project, nulled when the parent is deleted.
        #[max_length = 64]
        project_id -> Nullable<Varchar>,
        /// Linked sprint, nulled when the parent is deleted.
        #[max_length = 64]
        sprint_id -> Nullable<Varchar>,
        /// Soft-delete marker set when a parent is deleted.
        parent_deleted_at -> Nullable<Timestamptz>,
        /// Full aggregate payload.
        data -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
