//! Full-roster flows through the assembled orchestrator.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use trip_concierge::messaging::{
    EndUserMessage, MessagePayload, StructuredData, TopicId, FLIGHT_TOPIC,
};
use trip_concierge::{ConciergeConfig, TravelOrchestrator, UserReply};

fn concierge() -> (TravelOrchestrator, mpsc::UnboundedReceiver<UserReply>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    TravelOrchestrator::with_channel(&ConciergeConfig::default())
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<UserReply>) -> UserReply {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("reply within deadline")
        .expect("sink open")
}

#[tokio::test]
async fn test_greeting_short_circuits_to_user() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message("sess-1", "Hello!")
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    assert_eq!(reply.session(), "sess-1");
    match reply {
        UserReply::Structured { response, .. } => {
            assert!(matches!(response.data, StructuredData::Greeter(_)));
            assert!(response.message.contains("User greeting detected"));
        }
        other => panic!("expected structured greeting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_flight_request_books_directly() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message(
            "sess-1",
            "book a flight from New York to Paris 2023-12-20 to 2023-12-30",
        )
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    match reply {
        UserReply::Structured { response, .. } => match response.data {
            StructuredData::Flight(booking) => {
                assert_eq!(booking.departure_city, "New York");
                assert_eq!(booking.destination_city, "Paris");
                assert_eq!(booking.departure_date, "2023-12-20");
                assert_eq!(booking.return_date, "2023-12-30");
                assert_eq!(booking.number_of_passengers, 2);
                assert!(booking.booking_reference.starts_with("FL-"));
            }
            other => panic!("expected flight booking, got {other:?}"),
        },
        other => panic!("expected structured reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unbookable_flight_request_apologizes() {
    let (orchestrator, mut rx) = concierge();

    // "flight" routes to the specialist but carries no city pair.
    orchestrator
        .submit_user_message("sess-1", "flight please")
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    assert_eq!(reply.content(), "Failed to book flight. Please try again.");
}

#[tokio::test]
async fn test_composite_request_compiles_full_plan() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message(
            "sess-1",
            "Put together a travel plan from New York to Paris 2023-12-20 to 2023-12-30",
        )
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    let content = reply.content();
    assert!(content.starts_with("Here is your comprehensive travel plan:"));
    assert!(content.contains("Flight booked:"));
    assert!(content.contains("Hotel booked:"));
    // Subtask order: the registry lists the flight specialist first.
    let flight_at = content.find("Flight booked:").unwrap();
    let hotel_at = content.find("Hotel booked:").unwrap();
    assert!(flight_at < hotel_at);
}

#[tokio::test]
async fn test_specialist_handoff_reenters_routing() {
    let (orchestrator, mut rx) = concierge();

    // Deliver the composite ask straight to the flight specialist, as if a
    // client addressed it directly. The specialist must hand it back rather
    // than book only the flight leg.
    orchestrator
        .bus()
        .publish(
            MessagePayload::EndUserMessage(EndUserMessage::new(
                "arrange a travel plan from New York to Paris 2023-12-20 to 2023-12-30",
                "user",
            )),
            TopicId::new(FLIGHT_TOPIC, "sess-1"),
        )
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    let content = reply.content();
    assert!(content.starts_with("Here is your comprehensive travel plan:"));
    assert!(content.contains("Flight booked:"));
    assert!(content.contains("Hotel booked:"));
}

#[tokio::test]
async fn test_handoff_of_request_wording_complete_still_answers() {
    let (orchestrator, mut rx) = concierge();

    // The word "complete" in the user's request must not be taken as a
    // conversation-completion signal when the specialist hands the turn back.
    orchestrator
        .bus()
        .publish(
            MessagePayload::EndUserMessage(EndUserMessage::new(
                "arrange a complete travel plan from New York to Paris 2023-12-20 to 2023-12-30",
                "user",
            )),
            TopicId::new(FLIGHT_TOPIC, "sess-1"),
        )
        .await
        .unwrap();

    let reply = recv(&mut rx).await;
    let content = reply.content();
    assert!(content.starts_with("Here is your comprehensive travel plan:"));
    assert!(content.contains("Flight booked:"));
    assert!(content.contains("Hotel booked:"));
}

#[tokio::test]
async fn test_completed_session_stays_quiet() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message(
            "sess-1",
            "travel plan from New York to Paris 2023-12-20 to 2023-12-30",
        )
        .await
        .unwrap();
    recv(&mut rx).await;

    // Re-submitting the composite for the same session reaches a finalized
    // coordinator and is rejected without output.
    orchestrator
        .submit_user_message(
            "sess-1",
            "travel plan from New York to Paris 2023-12-20 to 2023-12-30",
        )
        .await
        .unwrap();
    assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_retire_session_drops_instances() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message("sess-1", "Hello!")
        .await
        .unwrap();
    recv(&mut rx).await;
    assert!(orchestrator.bus().instance_count() > 0);

    orchestrator.retire_session("sess-1");
    assert_eq!(orchestrator.bus().instance_count(), 0);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (orchestrator, mut rx) = concierge();

    orchestrator
        .submit_user_message("sess-a", "Hello!")
        .await
        .unwrap();
    orchestrator
        .submit_user_message("sess-b", "Hello!")
        .await
        .unwrap();

    let first = recv(&mut rx).await;
    let second = recv(&mut rx).await;
    let mut sessions = vec![first.session().to_string(), second.session().to_string()];
    sessions.sort();
    assert_eq!(sessions, ["sess-a", "sess-b"]);
}
