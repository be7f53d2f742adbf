//! Filterable fields of jobs and applications.

use crate::models::application::ApplicationRow;
use crate::models::job::JobRow;
use crate::query::filter::{FieldKind, FieldValue, FilterField, Filterable, Scalar};

fn single(path: &[String]) -> Option<&str> {
    match path {
        [name] => Some(name.as_str()),
        _ => None,
    }
}

fn text(value: &Option<String>) -> FieldValue {
    value
        .as_ref()
        .map(|v| FieldValue::Scalar(Scalar::Text(v.clone())))
        .unwrap_or(FieldValue::Missing)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    JobTitle,
    Jd,
    AboutCompany,
    Experience,
    JobType,
    JobLocation,
    Salary,
    Skills,
    Perks,
    StartingDate,
    LastApply,
    Category,
    CreatedAt,
}

impl JobField {
    const ALL: [JobField; 13] = [
        JobField::JobTitle,
        JobField::Jd,
        JobField::AboutCompany,
        JobField::Experience,
        JobField::JobType,
        JobField::JobLocation,
        JobField::Salary,
        JobField::Skills,
        JobField::Perks,
        JobField::StartingDate,
        JobField::LastApply,
        JobField::Category,
        JobField::CreatedAt,
    ];
}

impl FilterField for JobField {
    fn resolve(path: &[String]) -> Option<Self> {
        let name = single(path)?;
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn name(&self) -> &'static str {
        match self {
            JobField::JobTitle => "jobTitle",
            JobField::Jd => "jd",
            JobField::AboutCompany => "aboutCompany",
            JobField::Experience => "experience",
            JobField::JobType => "jobType",
            JobField::JobLocation => "jobLocation",
            JobField::Salary => "salary",
            JobField::Skills => "skills",
            JobField::Perks => "perks",
            JobField::StartingDate => "startingDate",
            JobField::LastApply => "lastApply",
            JobField::Category => "category",
            JobField::CreatedAt => "createdAt",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            JobField::JobTitle => "job_title",
            JobField::Jd => "jd",
            JobField::AboutCompany => "about_company",
            JobField::Experience => "experience",
            JobField::JobType => "job_type",
            JobField::JobLocation => "job_location",
            JobField::Salary => "salary",
            JobField::Skills => "skills",
            JobField::Perks => "perks",
            JobField::StartingDate => "starting_date",
            JobField::LastApply => "last_apply",
            JobField::Category => "category_id",
            JobField::CreatedAt => "created_at",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            JobField::Experience | JobField::Salary => FieldKind::Integer,
            JobField::LastApply | JobField::CreatedAt => FieldKind::Timestamp,
            JobField::Skills => FieldKind::TextSet,
            JobField::Category => FieldKind::Uuid,
            _ => FieldKind::Text,
        }
    }

    fn is_text_search(&self) -> bool {
        matches!(self, JobField::JobTitle)
    }
}

impl Filterable<JobField> for JobRow {
    fn value_of(&self, field: JobField) -> FieldValue {
        match field {
            JobField::JobTitle => FieldValue::Scalar(Scalar::Text(self.job_title.clone())),
            JobField::Jd => FieldValue::Scalar(Scalar::Text(self.jd.clone())),
            JobField::AboutCompany => FieldValue::Scalar(Scalar::Text(self.about_company.clone())),
            JobField::Experience => self
                .experience
                .map(|v| FieldValue::Scalar(Scalar::Integer(v.into())))
                .unwrap_or(FieldValue::Missing),
            JobField::JobType => text(&self.job_type),
            JobField::JobLocation => text(&self.job_location),
            JobField::Salary => self
                .salary
                .map(|v| FieldValue::Scalar(Scalar::Integer(v)))
                .unwrap_or(FieldValue::Missing),
            JobField::Skills => FieldValue::Set(self.skills.clone()),
            JobField::Perks => text(&self.perks),
            JobField::StartingDate => text(&self.starting_date),
            JobField::LastApply => self
                .last_apply
                .map(|v| FieldValue::Scalar(Scalar::Timestamp(v)))
                .unwrap_or(FieldValue::Missing),
            JobField::Category => FieldValue::Scalar(Scalar::Uuid(self.category_id)),
            JobField::CreatedAt => FieldValue::Scalar(Scalar::Timestamp(self.created_at)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationField {
    Status,
    IsScheduled,
    AssignedTo,
    Job,
    Applicant,
    Category,
    SalaryOffered,
    InterviewTime,
    CreatedAt,
}

impl ApplicationField {
    const ALL: [ApplicationField; 9] = [
        ApplicationField::Status,
        ApplicationField::IsScheduled,
        ApplicationField::AssignedTo,
        ApplicationField::Job,
        ApplicationField::Applicant,
        ApplicationField::Category,
        ApplicationField::SalaryOffered,
        ApplicationField::InterviewTime,
        ApplicationField::CreatedAt,
    ];
}

impl FilterField for ApplicationField {
    fn resolve(path: &[String]) -> Option<Self> {
        let name = single(path)?;
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn name(&self) -> &'static str {
        match self {
            ApplicationField::Status => "status",
            ApplicationField::IsScheduled => "isScheduled",
            ApplicationField::AssignedTo => "assignedTo",
            ApplicationField::Job => "job",
            ApplicationField::Applicant => "applicant",
            ApplicationField::Category => "category",
            ApplicationField::SalaryOffered => "salaryOffered",
            ApplicationField::InterviewTime => "interviewTime",
            ApplicationField::CreatedAt => "createdAt",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ApplicationField::Status => "status",
            ApplicationField::IsScheduled => "is_scheduled",
            ApplicationField::AssignedTo => "assigned_to",
            ApplicationField::Job => "job_id",
            ApplicationField::Applicant => "applicant_id",
            ApplicationField::Category => "category_id",
            ApplicationField::SalaryOffered => "salary_offered",
            ApplicationField::InterviewTime => "interview_time",
            ApplicationField::CreatedAt => "created_at",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            ApplicationField::Status => FieldKind::Status,
            ApplicationField::AssignedTo => FieldKind::Text,
            ApplicationField::IsScheduled => FieldKind::Boolean,
            ApplicationField::Job | ApplicationField::Applicant | ApplicationField::Category => {
                FieldKind::Uuid
            }
            ApplicationField::SalaryOffered => FieldKind::Integer,
            ApplicationField::InterviewTime | ApplicationField::CreatedAt => FieldKind::Timestamp,
        }
    }
}

impl Filterable<ApplicationField> for ApplicationRow {
    fn value_of(&self, field: ApplicationField) -> FieldValue {
        match field {
            ApplicationField::Status => FieldValue::Scalar(Scalar::Text(self.status.clone())),
            ApplicationField::IsScheduled => FieldValue::Scalar(Scalar::Boolean(self.is_scheduled)),
            ApplicationField::AssignedTo => text(&self.assigned_to),
            ApplicationField::Job => FieldValue::Scalar(Scalar::Uuid(self.job_id)),
            ApplicationField::Applicant => FieldValue::Scalar(Scalar::Uuid(self.applicant_id)),
            ApplicationField::Category => FieldValue::Scalar(Scalar::Uuid(self.category_id)),
            ApplicationField::SalaryOffered => self
                .salary_offered
                .map(|v| FieldValue::Scalar(Scalar::Integer(v)))
                .unwrap_or(FieldValue::Missing),
            ApplicationField::InterviewTime => self
                .interview_time
                .map(|v| FieldValue::Scalar(Scalar::Timestamp(v)))
                .unwrap_or(FieldValue::Missing),
            ApplicationField::CreatedAt => FieldValue::Scalar(Scalar::Timestamp(self.created_at)),
        }
    }
}
