diesel::table! {
    customers (id) {
        id -> Uuid,
        account_no -> Text,
        first_name -> Text,
        middle_name -> Nullable<Text>,
        last_name -> Text,
        email -> Nullable<Text>,
        mobile_no -> Nullable<Text>,
        address -> Nullable<Text>,
        barangay -> Nullable<Text>,
        city -> Nullable<Text>,
        province -> Nullable<Text>,
        status -> Text,
        created_by_user_id -> Nullable<Uuid>,
        updated_by_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    billing_accounts (id) {
        id -> Uuid,
        account_no -> Text,
        customer_id -> Uuid,
        plan_id -> Nullable<Uuid>,
        billing_status_id -> Int4,
        pppoe_username -> Nullable<Text>,
        billing_day -> Int4,
        balance -> Numeric,
        date_installed -> Nullable<Date>,
        created_by_user_id -> Nullable<Uuid>,
        updated_by_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    plans (id) {
        id -> Uuid,
        name -> Text,
        download_mbps -> Int4,
        upload_mbps -> Int4,
        monthly_fee -> Numeric,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    service_orders (id) {
        id -> Uuid,
        ticket_no -> Text,
        account_no -> Text,
        customer_id -> Nullable<Uuid>,
        concern -> Text,
        concern_details -> Nullable<Text>,
        support_status -> Text,
        visit_status -> Nullable<Text>,
        repair_category -> Nullable<Text>,
        repair_details -> Nullable<Text>,
        assigned_team -> Nullable<Text>,
        visit_by -> Nullable<Text>,
        visit_schedule -> Nullable<Timestamptz>,
        resolved_at -> Nullable<Timestamptz>,
        created_by_user_id -> Nullable<Uuid>,
        updated_by_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    job_orders (id) {
        id -> Uuid,
        jo_number -> Text,
        account_no -> Text,
        customer_id -> Nullable<Uuid>,
        order_type -> Text,
        status -> Text,
        installation_address -> Nullable<Text>,
        lcp_id -> Nullable<Uuid>,
        nap_id -> Nullable<Uuid>,
        port_no -> Nullable<Int4>,
        onu_serial -> Nullable<Text>,
        scheduled_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        assigned_team -> Nullable<Text>,
        created_by_user_id -> Nullable<Uuid>,
        updated_by_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    invoices (id) {
        id -> Uuid,
        invoice_no -> Text,
        account_no -> Text,
        amount -> Numeric,
        amount_paid -> Numeric,
        due_date -> Date,
        status -> Text,
        period_start -> Nullable<Date>,
        period_end -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    installment_schedules (id) {
        id -> Uuid,
        account_no -> Text,
        seq_no -> Int4,
        amount -> Numeric,
        due_date -> Date,
        status -> Text,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    pending_payments (id) {
        id -> Uuid,
        reference_no -> Text,
        account_no -> Text,
        amount -> Numeric,
        payment_status -> Text,
        xendit_invoice_id -> Nullable<Text>,
        invoice_url -> Nullable<Text>,
        payment_channel -> Nullable<Text>,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    inventory_items (id) {
        id -> Uuid,
        item_code -> Text,
        name -> Text,
        category -> Text,
        serial_no -> Nullable<Text>,
        quantity -> Int4,
        unit -> Nullable<Text>,
        status -> Text,
        assigned_account_no -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lcps (id) {
        id -> Uuid,
        code -> Text,
        name -> Text,
        barangay -> Nullable<Text>,
        port_count -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    naps (id) {
        id -> Uuid,
        lcp_id -> Uuid,
        code -> Text,
        port_count -> Int4,
        location -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    nap_ports (id) {
        id -> Uuid,
        nap_id -> Uuid,
        port_no -> Int4,
        status -> Text,
        account_no -> Nullable<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    vlans (id) {
        id -> Uuid,
        vlan_no -> Int4,
        description -> Nullable<Text>,
        site -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    provinces (id) {
        id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    cities (id) {
        id -> Uuid,
        province_id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    barangays (id) {
        id -> Uuid,
        city_id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notices (id) {
        id -> Uuid,
        account_no -> Nullable<Text>,
        channel -> Text,
        recipient -> Text,
        subject -> Nullable<Text>,
        body -> Text,
        status -> Text,
        error -> Nullable<Text>,
        sent_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}
