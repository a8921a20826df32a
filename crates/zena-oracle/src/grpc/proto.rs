//! Wire types and client for the `iris.v1.Iris` gRPC service.
//!
//! Hand-maintained in generated style: the proto surface is fixed, so the
//! messages and the client stub are kept in-tree instead of a build-time
//! codegen step.

/// One validator on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Validator {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub voting_power: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub address: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpanRequest {
    #[prost(uint64, tag = "1")]
    pub id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpanResponse {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub start_block: u64,
    #[prost(uint64, tag = "3")]
    pub end_block: u64,
    #[prost(message, repeated, tag = "4")]
    pub validators: ::prost::alloc::vec::Vec<Validator>,
    #[prost(message, repeated, tag = "5")]
    pub selected_producers: ::prost::alloc::vec::Vec<Validator>,
    #[prost(string, tag = "6")]
    pub chain_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateSyncEventsRequest {
    #[prost(uint64, tag = "1")]
    pub from_id: u64,
    #[prost(uint64, tag = "2")]
    pub to_time: u64,
    #[prost(uint64, tag = "3")]
    pub limit: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventRecord {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub contract: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub tx_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub log_index: u64,
    #[prost(string, tag = "6")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "7")]
    pub time: u64,
}

/// One streamed page of event records.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateSyncEventsResponse {
    #[prost(message, repeated, tag = "1")]
    pub events: ::prost::alloc::vec::Vec<EventRecord>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckpointRequest {
    /// 1-based checkpoint number; -1 requests the latest.
    #[prost(int64, tag = "1")]
    pub number: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckpointResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub proposer: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub start_block: u64,
    #[prost(uint64, tag = "3")]
    pub end_block: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub root_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "5")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "6")]
    pub timestamp: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MilestoneRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MilestoneResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub proposer: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub start_block: u64,
    #[prost(uint64, tag = "3")]
    pub end_block: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "5")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "6")]
    pub timestamp: u64,
    #[prost(string, tag = "7")]
    pub milestone_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CountRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CountResponse {
    #[prost(uint64, tag = "1")]
    pub count: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MilestoneIdRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InListResponse {
    #[prost(bool, tag = "1")]
    pub in_list: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LastNoAckResponse {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

/// Generated client implementations.
pub mod iris_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct IrisClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl IrisClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> IrisClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn span(
            &mut self,
            request: impl tonic::IntoRequest<super::SpanRequest>,
        ) -> std::result::Result<tonic::Response<super::SpanResponse>, tonic::Status> {
            self.unary(request, "/iris.v1.Iris/Span", "Span").await
        }

        pub async fn state_sync_events(
            &mut self,
            request: impl tonic::IntoRequest<super::StateSyncEventsRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::StateSyncEventsResponse>>,
            tonic::Status,
        > {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/iris.v1.Iris/StateSyncEvents");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("iris.v1.Iris", "StateSyncEvents"));
            self.inner.server_streaming(req, path, codec).await
        }

        pub async fn checkpoint(
            &mut self,
            request: impl tonic::IntoRequest<super::CheckpointRequest>,
        ) -> std::result::Result<tonic::Response<super::CheckpointResponse>, tonic::Status>
        {
            self.unary(request, "/iris.v1.Iris/Checkpoint", "Checkpoint")
                .await
        }

        pub async fn checkpoint_count(
            &mut self,
            request: impl tonic::IntoRequest<super::CountRequest>,
        ) -> std::result::Result<tonic::Response<super::CountResponse>, tonic::Status> {
            self.unary(
                request,
                "/iris.v1.Iris/CheckpointCount",
                "CheckpointCount",
            )
            .await
        }

        pub async fn milestone(
            &mut self,
            request: impl tonic::IntoRequest<super::MilestoneRequest>,
        ) -> std::result::Result<tonic::Response<super::MilestoneResponse>, tonic::Status>
        {
            self.unary(request, "/iris.v1.Iris/Milestone", "Milestone")
                .await
        }

        pub async fn milestone_count(
            &mut self,
            request: impl tonic::IntoRequest<super::CountRequest>,
        ) -> std::result::Result<tonic::Response<super::CountResponse>, tonic::Status> {
            self.unary(request, "/iris.v1.Iris/MilestoneCount", "MilestoneCount")
                .await
        }

        pub async fn no_ack_milestone(
            &mut self,
            request: impl tonic::IntoRequest<super::MilestoneIdRequest>,
        ) -> std::result::Result<tonic::Response<super::InListResponse>, tonic::Status> {
            self.unary(request, "/iris.v1.Iris/NoAckMilestone", "NoAckMilestone")
                .await
        }

        pub async fn last_no_ack_milestone(
            &mut self,
            request: impl tonic::IntoRequest<super::MilestoneRequest>,
        ) -> std::result::Result<tonic::Response<super::LastNoAckResponse>, tonic::Status>
        {
            self.unary(
                request,
                "/iris.v1.Iris/LastNoAckMilestone",
                "LastNoAckMilestone",
            )
            .await
        }

        pub async fn milestone_id(
            &mut self,
            request: impl tonic::IntoRequest<super::MilestoneIdRequest>,
        ) -> std::result::Result<tonic::Response<super::InListResponse>, tonic::Status> {
            self.unary(request, "/iris.v1.Iris/MilestoneID", "MilestoneID")
                .await
        }

        async fn ready(&mut self) -> std::result::Result<(), tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })
        }

        async fn unary<Req, Res>(
            &mut self,
            request: impl tonic::IntoRequest<Req>,
            path: &'static str,
            method: &'static str,
        ) -> std::result::Result<tonic::Response<Res>, tonic::Status>
        where
            Req: prost::Message + 'static,
            Res: prost::Message + Default + 'static,
        {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static(path);
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("iris.v1.Iris", method));
            self.inner.unary(req, path, codec).await
        }
    }
}
