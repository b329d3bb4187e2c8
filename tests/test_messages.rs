mod helpers;

use autocrm::domain::entities::*;
use autocrm::domain::ports::TicketRepository;
use autocrm::infrastructure::http::middleware::ApiError;
use helpers::*;

fn text(content: &str) -> CreateMessageRequest {
    CreateMessageRequest {
        content: content.to_string(),
        visibility: Visibility::Public,
        message_type: MessageType::Text,
        is_ai_generated: false,
        metadata: FieldMap::default(),
    }
}

fn internal_note(content: &str) -> CreateMessageRequest {
    CreateMessageRequest {
        visibility: Visibility::Internal,
        message_type: MessageType::Note,
        ..text(content)
    }
}

async fn customer_ticket(app: &TestApp, customer: &User) -> Ticket {
    app.state
        .ticket_service
        .create_ticket(
            &actor(customer),
            CreateTicketRequest {
                title: "Printer on fire".to_string(),
                description: String::new(),
                priority: None,
                tags: vec![],
                customer_email: None,
                custom_fields: FieldMap::default(),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_internal_messages_never_reach_customers() {
    let app = setup_test_app().await;
    let customer = create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let agent = create_test_user(app.db(), "agent@example.com", Role::Agent).await;
    let ticket = customer_ticket(&app, &customer).await;
    let service = &app.state.message_service;

    service
        .create_message(&actor(&customer), &ticket.id, text("Please help"))
        .await
        .unwrap();
    service
        .create_message(&actor(&agent), &ticket.id, internal_note("Looks like a driver issue"))
        .await
        .unwrap();
    service
        .create_message(&actor(&agent), &ticket.id, text("We are on it"))
        .await
        .unwrap();

    let seen_by_customer = service
        .list_messages(&actor(&customer), &ticket.id)
        .await
        .unwrap();
    let contents: Vec<&str> = seen_by_customer.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Please help", "We are on it"]);

    let seen_by_agent = service
        .list_messages(&actor(&agent), &ticket.id)
        .await
        .unwrap();
    assert_eq!(seen_by_agent.len(), 3);
    assert_eq!(seen_by_agent[1].visibility, Visibility::Internal);
}

#[tokio::test]
async fn test_customer_posting_rules() {
    let app = setup_test_app().await;
    let customer = create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let stranger = create_test_user(app.db(), "other@example.com", Role::Customer).await;
    let ticket = customer_ticket(&app, &customer).await;
    let service = &app.state.message_service;

    let err = service
        .create_message(&actor(&customer), &ticket.id, internal_note("sneaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let mut ai = text("Generated");
    ai.is_ai_generated = true;
    let err = service
        .create_message(&actor(&customer), &ticket.id, ai)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = service
        .create_message(&actor(&stranger), &ticket.id, text("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = service
        .create_message(&actor(&customer), &ticket.id, text("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let mut status = text("Status changed");
    status.message_type = MessageType::StatusChange;
    let err = service
        .create_message(&actor(&customer), &ticket.id, status)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_other_customers_ticket_reads_as_empty() {
    let app = setup_test_app().await;
    let customer = create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let stranger = create_test_user(app.db(), "other@example.com", Role::Customer).await;
    let ticket = customer_ticket(&app, &customer).await;
    let service = &app.state.message_service;

    service
        .create_message(&actor(&customer), &ticket.id, text("Private details"))
        .await
        .unwrap();

    assert!(service
        .list_messages(&actor(&stranger), &ticket.id)
        .await
        .unwrap()
        .is_empty());
    assert!(service
        .list_messages(&actor(&stranger), "no-such-ticket")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_ai_flag_is_kept_and_activity_bumped() {
    let app = setup_test_app().await;
    let customer = create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let agent = create_test_user(app.db(), "agent@example.com", Role::Agent).await;
    let ticket = customer_ticket(&app, &customer).await;

    let mut reply = text("Try turning it off and on again");
    reply.is_ai_generated = true;
    let message = app
        .state
        .message_service
        .create_message(&actor(&agent), &ticket.id, reply)
        .await
        .unwrap();
    assert!(message.is_ai_generated);

    let listed = app
        .state
        .message_service
        .list_messages(&actor(&customer), &ticket.id)
        .await
        .unwrap();
    assert!(listed[0].is_ai_generated);

    let reloaded = app.db().get_ticket(&ticket.id).await.unwrap().unwrap();
    assert_eq!(reloaded.last_activity_at, message.created_at);
}

#[tokio::test]
async fn test_attachments_are_staff_only() {
    let app = setup_test_app().await;
    let customer = create_test_user(app.db(), "cust@example.com", Role::Customer).await;
    let agent = create_test_user(app.db(), "agent@example.com", Role::Agent).await;
    let ticket = customer_ticket(&app, &customer).await;
    let service = &app.state.message_service;

    let message = service
        .create_message(&actor(&agent), &ticket.id, text("See attached log"))
        .await
        .unwrap();

    let request = CreateAttachmentRequest {
        file_name: "printer.log".to_string(),
        content_type: "text/plain".to_string(),
        size_bytes: 2048,
        storage_path: "attachments/printer.log".to_string(),
    };

    let err = service
        .add_attachment(&actor(&customer), &message.id, request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let attachment = service
        .add_attachment(&actor(&agent), &message.id, request)
        .await
        .unwrap();
    assert_eq!(attachment.message_id, message.id);

    let listed = service
        .list_attachments(&actor(&agent), &message.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "printer.log");

    let err = service
        .list_attachments(&actor(&agent), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
