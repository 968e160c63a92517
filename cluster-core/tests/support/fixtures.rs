use broker_client::{BrokerMetadata, MetadataResponse, PartitionMetadata, TopicMetadata};

pub fn broker(node_id: i32, port: u16) -> BrokerMetadata {
    BrokerMetadata {
        node_id,
        host: "127.0.0.1".to_string(),
        port,
        rack: None,
    }
}

pub fn partition(partition_id: i32, leader: Option<i32>, replicas: Vec<i32>) -> PartitionMetadata {
    PartitionMetadata {
        partition_id,
        leader,
        isr: replicas.clone(),
        replicas,
        partition_error_code: 0,
    }
}

pub fn topic(name: &str, partitions: Vec<PartitionMetadata>) -> TopicMetadata {
    TopicMetadata {
        topic: name.to_string(),
        topic_error_code: 0,
        partitions,
    }
}

/// A two-broker, one-topic, two-partition cluster: partition 0 led by node
/// 1, partition 1 led by node 2. Node 1 is also the controller.
pub fn two_broker_metadata(topic_name: &str) -> MetadataResponse {
    MetadataResponse {
        controller_id: Some(1),
        brokers: vec![broker(1, 9091), broker(2, 9092)],
        topics: vec![topic(
            topic_name,
            vec![
                partition(0, Some(1), vec![1, 2]),
                partition(1, Some(2), vec![1, 2]),
            ],
        )],
    }
}
