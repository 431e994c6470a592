use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::engine::alerts::{self, NewSos};
use crate::engine::{lifecycle, sequencing};
use crate::models::order::{ConfirmationMethod, Location, Order, OrderStatus};
use crate::models::sos::{ProblemCode, SosMessage};
use crate::state::AppState;

pub mod pb {
    tonic::include_proto!("fleet");
}

use pb::fleet_service_server::FleetService;
use pb::{
    ConfirmDeliveryRequest, GetDriverQueueRequest, GetDriverQueueResponse, ListSosRequest,
    ListSosResponse, OrderResponse, SosResponse, SubmitSosRequest, UpdateOrderStatusRequest,
};

/// Driver-app facing service. Unary calls only.
pub struct GrpcFleetService {
    state: Arc<AppState>,
}

impl GrpcFleetService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

fn location_to_proto(location: &Location) -> pb::Location {
    pb::Location {
        address: location.address.clone(),
        lat: location.lat,
        lng: location.lng,
    }
}

fn order_to_proto(o: &Order) -> OrderResponse {
    OrderResponse {
        id: o.id.clone(),
        status: o.status.to_string(),
        pickup: Some(location_to_proto(&o.pickup)),
        destination: Some(location_to_proto(&o.destination)),
        recipient_name: o.recipient.name.clone(),
        recipient_phone: o.recipient.phone.clone(),
        assigned_driver: o.assigned_driver.clone().unwrap_or_default(),
        completed_at: o
            .completed_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_default(),
        return_reason: o.return_reason.clone().unwrap_or_default(),
        confirmation_method: o
            .confirmation
            .as_ref()
            .map(|c| c.method.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn sos_to_proto(m: &SosMessage) -> SosResponse {
    SosResponse {
        id: m.id.to_string(),
        driver_id: m.driver_id.clone(),
        driver_name: m.driver_name.clone(),
        message: m.message.clone(),
        problem_code: m.problem_code.as_str().to_string(),
        severity: m.severity.as_str().to_string(),
        location: m.location.clone(),
        created_at: m.created_at.to_rfc3339(),
    }
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

#[tonic::async_trait]
impl FleetService for GrpcFleetService {
    async fn get_driver_queue(
        &self,
        request: Request<GetDriverQueueRequest>,
    ) -> Result<Response<GetDriverQueueResponse>, Status> {
        let req = request.into_inner();
        if req.driver_id.trim().is_empty() {
            return Err(Status::invalid_argument("driver_id is required"));
        }

        let entries = sequencing::queue_for_driver(&self.state, req.driver_id.trim())
            .iter()
            .map(|entry| pb::QueueEntry {
                order: Some(order_to_proto(&entry.order)),
                actionable: entry.actionable,
            })
            .collect();

        Ok(Response::new(GetDriverQueueResponse { entries }))
    }

    async fn update_order_status(
        &self,
        request: Request<UpdateOrderStatusRequest>,
    ) -> Result<Response<OrderResponse>, Status> {
        let req = request.into_inner();
        let status: OrderStatus = req.status.parse()?;

        let order = lifecycle::transition(
            &self.state,
            &req.order_id,
            status,
            non_empty(req.return_reason),
        )?;

        Ok(Response::new(order_to_proto(&order)))
    }

    async fn confirm_delivery(
        &self,
        request: Request<ConfirmDeliveryRequest>,
    ) -> Result<Response<OrderResponse>, Status> {
        let req = request.into_inner();
        let method: ConfirmationMethod = req.method.parse()?;

        let order = lifecycle::confirm_delivery(&self.state, &req.order_id, method, req.payload)?;

        Ok(Response::new(order_to_proto(&order)))
    }

    async fn submit_sos(
        &self,
        request: Request<SubmitSosRequest>,
    ) -> Result<Response<SosResponse>, Status> {
        let req = request.into_inner();
        let problem_code: ProblemCode = req.problem_code.parse()?;

        let stored = alerts::submit_sos(
            &self.state,
            NewSos {
                driver_id: req.driver_id,
                driver_name: req.driver_name,
                message: req.message,
                problem_code,
                location: req.location,
            },
        )?;

        Ok(Response::new(sos_to_proto(&stored)))
    }

    async fn list_sos(
        &self,
        _request: Request<ListSosRequest>,
    ) -> Result<Response<ListSosResponse>, Status> {
        let messages = alerts::list_sos(&self.state)
            .iter()
            .map(sos_to_proto)
            .collect();

        Ok(Response::new(ListSosResponse { messages }))
    }
}
