pub mod assignment_dto;
