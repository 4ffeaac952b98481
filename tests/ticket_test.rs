mod tools;

#[cfg(test)]
mod ticket_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ponto_bot_lib::commands::ticket::TicketController;
    use ponto_bot_lib::error::BotError;
    use ponto_bot_lib::platform::{TicketChannel, TicketEvent};
    use serenity::all::{ChannelId, RoleId, UserId};

    use crate::tools::mock_platform::{actor, staff, MockPlatform};

    const STAFF_ROLE: u64 = 1380998072628281414;

    fn controller() -> TicketController {
        TicketController::new(
            "corregedoria",
            Some(ChannelId::new(1383777816109256845)),
            vec![RoleId::new(STAFF_ROLE), RoleId::new(1380998057562341477)],
        )
    }

    #[tokio::test]
    async fn test_open_creates_private_channel() {
        let tickets = controller();
        let platform = MockPlatform::default();

        let channel = tickets
            .open(&platform, &actor(10, "Petro.K", "137 - Petro"))
            .await
            .unwrap();
        assert_eq!(channel.name, "corregedoria-petrok");

        let created = platform.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].owner, UserId::new(10));
        assert_eq!(created[0].category, Some(ChannelId::new(1383777816109256845)));
        assert_eq!(created[0].staff_roles.len(), 2);

        assert_eq!(
            platform.controls.lock().unwrap().clone(),
            vec![(channel.id, UserId::new(10))]
        );
        assert_eq!(
            platform.ticket_events(),
            vec![TicketEvent::Opened {
                channel: channel.id,
                by: UserId::new(10),
            }]
        );
    }

    #[tokio::test]
    async fn test_second_open_is_duplicate() {
        let tickets = controller();
        let platform = MockPlatform::default();
        let petro = actor(10, "petro", "137 - Petro");

        tickets.open(&platform, &petro).await.unwrap();
        let err = tickets.open(&platform, &petro).await.unwrap_err();
        assert!(matches!(err, BotError::DuplicateTicket));
        assert_eq!(platform.created.lock().unwrap().len(), 1);

        // another requester is unaffected
        tickets
            .open(&platform, &actor(11, "ana", "42 - Ana"))
            .await
            .unwrap();
        assert_eq!(platform.created.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_close_requires_authorized_role() {
        let tickets = controller();
        let platform = MockPlatform::default();
        let channel = tickets
            .open(&platform, &actor(10, "petro", "137 - Petro"))
            .await
            .unwrap();

        let err = tickets
            .close(&platform, &actor(10, "petro", "137 - Petro"), &channel)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Unauthorized));
        assert!(platform.deleted.lock().unwrap().is_empty());

        tickets
            .close(&platform, &staff(20, "chefe", STAFF_ROLE), &channel)
            .await
            .unwrap();
        assert_eq!(platform.deleted.lock().unwrap().clone(), vec![channel.id]);
        assert_eq!(
            platform.ticket_events().last(),
            Some(&TicketEvent::Closed {
                channel_name: "corregedoria-petro".into(),
                by: UserId::new(20),
            })
        );

        // the name is free again
        tickets
            .open(&platform, &actor(10, "petro", "137 - Petro"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_admin_may_close() {
        let tickets = controller();
        let mut admin = actor(30, "admin", "admin");
        admin.is_admin = true;
        assert!(tickets.can_close(&admin));
        assert!(tickets.can_close(&staff(20, "chefe", STAFF_ROLE)));
        assert!(!tickets.can_close(&staff(21, "outro", 999)));
    }

    #[tokio::test]
    async fn test_notify_reaches_owner() {
        let tickets = controller();
        let platform = MockPlatform::default();
        let channel = tickets
            .open(&platform, &actor(10, "petro", "137 - Petro"))
            .await
            .unwrap();

        let owner = tickets.notify(&platform, &channel).await.unwrap();
        assert_eq!(owner, UserId::new(10));
        let dms = platform.dms.lock().unwrap().clone();
        assert_eq!(dms.len(), 1);
        assert!(dms[0].1.contains("corregedoria-petro"));
    }

    #[tokio::test]
    async fn test_notify_failures() {
        let tickets = controller();

        let platform = MockPlatform::default();
        let orphan = TicketChannel {
            id: ChannelId::new(77),
            name: "geral".into(),
        };
        let err = tickets.notify(&platform, &orphan).await.unwrap_err();
        assert!(matches!(err, BotError::TargetNotFound));

        let platform = MockPlatform {
            fail_dm: true,
            ..Default::default()
        };
        let channel = tickets
            .open(&platform, &actor(10, "petro", "137 - Petro"))
            .await
            .unwrap();
        let err = tickets.notify(&platform, &channel).await.unwrap_err();
        assert!(matches!(err, BotError::DeliveryFailed));
    }

    #[tokio::test]
    async fn test_add_and_remove_person() {
        let tickets = controller();
        let target = UserId::new(123456789012345678);
        let platform = MockPlatform {
            guild_members: vec![target],
            ..Default::default()
        };
        let channel = ChannelId::new(500);

        let added = tickets
            .add_person(&platform, channel, " 123456789012345678 ")
            .await
            .unwrap();
        assert_eq!(added, target);
        assert_eq!(platform.grants.lock().unwrap().clone(), vec![(channel, target)]);

        let removed = tickets
            .remove_person(&platform, channel, "123456789012345678")
            .await
            .unwrap();
        assert_eq!(removed, target);
        assert_eq!(platform.revokes.lock().unwrap().clone(), vec![(channel, target)]);
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let tickets = controller();
        let platform = MockPlatform::default();
        let channel = ChannelId::new(500);

        for raw in ["999999999999999999", "not-an-id", ""] {
            let err = tickets.add_person(&platform, channel, raw).await.unwrap_err();
            assert!(matches!(err, BotError::TargetNotFound));
        }
        assert!(platform.grants.lock().unwrap().is_empty());

        let failing = MockPlatform {
            fail_member_lookup: true,
            ..Default::default()
        };
        let err = tickets
            .remove_person(&failing, channel, "123456789012345678")
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::TargetNotFound));
        assert!(failing.revokes.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_opens_create_one_channel() {
        let tickets = Arc::new(controller());
        let platform = Arc::new(MockPlatform {
            create_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let petro = actor(10, "petro", "137 - Petro");

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let (tickets, platform, petro) = (tickets.clone(), platform.clone(), petro.clone());
                tokio::spawn(async move { tickets.open(&*platform, &petro).await })
            })
            .collect();

        let mut opened = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(BotError::DuplicateTicket) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(opened, 1);
        assert_eq!(duplicates, 4);
        assert_eq!(platform.created.lock().unwrap().len(), 1);
        assert_eq!(platform.controls.lock().unwrap().len(), 1);
    }
}
